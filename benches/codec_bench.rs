use criterion::{black_box, criterion_group, criterion_main, Criterion};
use roguesav::mon::{decode, encode};
use roguesav::profile::{FormatVersion, PROFILE_V2};
use roguesav::store::{assemble, serialize};

fn bench_store(c: &mut Criterion) {
    let image = vec![0u8; PROFILE_V2.image_size()];
    let regions = assemble(&image, &PROFILE_V2).unwrap().regions;

    c.bench_function("assemble_128k", |b| b.iter(|| assemble(black_box(&image), &PROFILE_V2).unwrap()));
    c.bench_function("serialize_128k", |b| b.iter(|| serialize(black_box(&regions), &PROFILE_V2).unwrap()));
}

fn bench_record(c: &mut Criterion) {
    let raw: Vec<u8> = (0..80u8).map(|i| i.wrapping_mul(37)).collect();
    let mon = decode(&raw, FormatVersion::V1).unwrap();

    c.bench_function("record_decode", |b| b.iter(|| decode(black_box(&raw), FormatVersion::V1).unwrap()));
    c.bench_function("record_encode_v1_to_v2", |b| {
        b.iter(|| encode(black_box(&mon), FormatVersion::V2, Some(0x1234_5678)))
    });
}

criterion_group!(benches, bench_store, bench_record);
criterion_main!(benches);
