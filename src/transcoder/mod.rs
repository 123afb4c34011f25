//! Save interpretation: version detection and snapshot extraction.
//!
//! Reading and writing are separate phases.  [`extract_snapshot`] only reads
//! the assembled regions and returns an immutable [`GameStateSnapshot`];
//! [`mutation::apply_mutation`] takes regions plus snapshot and returns a new
//! [`RegionSet`].  Callers re-extract to observe the result.

pub mod mutation;

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::items::{read_bag, ItemStack};
use crate::mon::{self, MonError, PokemonRecord};
use crate::pokedex::{to_status_array, PokedexState};
use crate::profile::{
    FormatProfile, FormatVersion, BOX_MON_SIZE, BOX_STORAGE_OFFSET, MONS_PER_BOX,
    PARTY_COUNT_OFFSET, PARTY_OFFSET, PARTY_SIZE, PLAYER_NAME_LENGTH, PLAY_HOURS_OFFSET,
    PLAY_MINUTES_OFFSET, TOTAL_BOXES, TRAINER_GENDER_OFFSET, TRAINER_ID_OFFSET,
    VERSION_FIELD_OFFSET, VERSION_FIELD_V1,
};
use crate::sector::{RegionName, SectorError};
use crate::store::{LogicalRegion, RegionSet};
use crate::text;

pub use mutation::{apply_mutation, Mutation};

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Save looks like format {detected}, but was read with the {profile} profile")]
    StructuralMismatch { detected: DetectedVersion, profile: FormatVersion },
    #[error("Unrecognized save format")]
    UnrecognizedFormat,
    #[error("Sector error: {0}")]
    Sector(#[from] SectorError),
    #[error("Record error: {0}")]
    Mon(#[from] MonError),
}

// ── Version detection ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DetectedVersion {
    V1,
    V2,
    /// SAVEBLOCK1 was never written.
    Unknown,
}

impl DetectedVersion {
    pub fn version(self) -> Option<FormatVersion> {
        match self {
            DetectedVersion::V1      => Some(FormatVersion::V1),
            DetectedVersion::V2      => Some(FormatVersion::V2),
            DetectedVersion::Unknown => None,
        }
    }
}

impl std::fmt::Display for DetectedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.version() {
            Some(v) => write!(f, "{v}"),
            None    => f.write_str("unknown"),
        }
    }
}

pub fn detect_version(sb1: &LogicalRegion) -> DetectedVersion {
    if !sb1.is_populated() {
        return DetectedVersion::Unknown;
    }
    match LittleEndian::read_u16(&sb1.data[VERSION_FIELD_OFFSET..]) {
        VERSION_FIELD_V1 => DetectedVersion::V1,
        _                => DetectedVersion::V2,
    }
}

/// Detected version, provided it agrees with `profile`.
pub fn check_profile(regions: &RegionSet, profile: &FormatProfile) -> Result<FormatVersion, TranscodeError> {
    let detected = detect_version(&regions[RegionName::Slot1SaveBlock1]);
    match detected.version() {
        Some(v) if v == profile.version => Ok(v),
        _ => Err(TranscodeError::StructuralMismatch { detected, profile: profile.version }),
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trainer {
    pub name:     String,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub name_raw: [u8; PLAYER_NAME_LENGTH + 1],
    pub id:       u32,
    /// 0 male, 1 female.
    pub gender:   u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayStats {
    pub hours:   u16,
    pub minutes: u8,
    pub money:   u32,
}

/// A record stored in the PC, with 1-based box and slot numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoxedRecord {
    #[serde(rename = "box")]
    pub box_number: usize,
    pub slot:       usize,
    pub record:     PokemonRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameStateSnapshot {
    pub version: FormatVersion,
    pub trainer: Trainer,
    pub stats:   PlayStats,
    pub party:   Vec<PokemonRecord>,
    pub boxes:   Vec<BoxedRecord>,
    pub items:   Vec<ItemStack>,
    pub pokedex: PokedexState,
    /// Global XOR key for money and item quantities.
    pub key:     u32,
}

impl GameStateSnapshot {
    /// Party members first, then boxed records in slot order.
    pub fn records(&self) -> impl Iterator<Item = &PokemonRecord> {
        self.party.iter().chain(self.boxes.iter().map(|b| &b.record))
    }

    pub fn is_box_slot_occupied(&self, box_number: usize, slot: usize) -> bool {
        self.boxes.iter().any(|b| b.box_number == box_number && b.slot == slot)
    }
}

/// Byte offset of a box slot inside PKMNSTORAGE (0-based indices).
pub fn box_slot_offset(box_index: usize, slot_index: usize) -> usize {
    BOX_STORAGE_OFFSET + (box_index * MONS_PER_BOX + slot_index) * BOX_MON_SIZE
}

pub(crate) fn read_key(sb2: &[u8], profile: &FormatProfile) -> u32 {
    LittleEndian::read_u32(&sb2[profile.encryption_key_offset..])
}

fn read_trainer(sb2: &[u8]) -> Trainer {
    let mut name_raw = [0u8; PLAYER_NAME_LENGTH + 1];
    name_raw.copy_from_slice(&sb2[..PLAYER_NAME_LENGTH + 1]);
    Trainer {
        name: text::decode(&name_raw),
        name_raw,
        id: LittleEndian::read_u32(&sb2[TRAINER_ID_OFFSET..]),
        gender: sb2[TRAINER_GENDER_OFFSET] & 0x1,
    }
}

fn read_party(sb1: &[u8], profile: &FormatProfile) -> Result<Vec<PokemonRecord>, MonError> {
    let count = (sb1[PARTY_COUNT_OFFSET] as usize).min(PARTY_SIZE);
    (0..count)
        .map(|i| {
            let at = PARTY_OFFSET + i * profile.mon_struct_size;
            mon::decode(&sb1[at..at + BOX_MON_SIZE], profile.version)
        })
        .collect()
}

fn read_boxes(storage: &[u8], profile: &FormatProfile) -> Result<Vec<BoxedRecord>, MonError> {
    let mut out = Vec::new();
    for box_index in 0..TOTAL_BOXES {
        for slot_index in 0..MONS_PER_BOX {
            let at = box_slot_offset(box_index, slot_index);
            let raw = &storage[at..at + BOX_MON_SIZE];
            if mon::is_empty_slot(raw) {
                continue;
            }
            out.push(BoxedRecord {
                box_number: box_index + 1,
                slot:       slot_index + 1,
                record:     mon::decode(raw, profile.version)?,
            });
        }
    }
    Ok(out)
}

/// Read the full game state out of slot 1.
pub fn extract_snapshot(regions: &RegionSet, profile: &FormatProfile) -> Result<GameStateSnapshot, TranscodeError> {
    let version = check_profile(regions, profile)?;
    let sb1     = &regions[RegionName::Slot1SaveBlock1].data;
    let sb2     = &regions[RegionName::Slot1SaveBlock2].data;
    let storage = &regions[RegionName::Slot1PkmnStorage].data;

    let key = read_key(sb2, profile);
    let stats = PlayStats {
        hours:   LittleEndian::read_u16(&sb2[PLAY_HOURS_OFFSET..]),
        minutes: sb2[PLAY_MINUTES_OFFSET],
        money:   LittleEndian::read_u32(&sb1[profile.money_offset..]) ^ key,
    };

    let dex_seen   = &sb1[profile.dex_seen_offset..profile.dex_seen_offset + profile.dex_size];
    let dex_caught = &sb1[profile.dex_caught_offset()..profile.dex_caught_offset() + profile.dex_size];

    let snapshot = GameStateSnapshot {
        version,
        trainer: read_trainer(sb2),
        stats,
        party:   read_party(sb1, profile)?,
        boxes:   read_boxes(storage, profile)?,
        items:   read_bag(sb1, profile, key),
        pokedex: to_status_array(dex_seen, dex_caught, version),
        key,
    };
    debug!(
        %version,
        party = snapshot.party.len(),
        boxed = snapshot.boxes.len(),
        items = snapshot.items.len(),
        "extracted snapshot"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{PROFILE_V1, PROFILE_V2};

    fn regions_with_version(profile: &FormatProfile, field: u16) -> RegionSet {
        let mut regions = RegionSet::new(profile);
        let sb1 = &mut regions[RegionName::Slot1SaveBlock1];
        LittleEndian::write_u16(&mut sb1.data[VERSION_FIELD_OFFSET..], field);
        sb1.sectors_merged = 1;
        regions
    }

    #[test]
    fn version_field_four_means_v1() {
        let r = regions_with_version(&PROFILE_V1, 4);
        assert_eq!(detect_version(&r[RegionName::Slot1SaveBlock1]), DetectedVersion::V1);
        let r = regions_with_version(&PROFILE_V2, 0x2000);
        assert_eq!(detect_version(&r[RegionName::Slot1SaveBlock1]), DetectedVersion::V2);
        let r = RegionSet::new(&PROFILE_V2);
        assert_eq!(detect_version(&r[RegionName::Slot1SaveBlock1]), DetectedVersion::Unknown);
    }

    #[test]
    fn mismatched_profile_is_structural() {
        let r = regions_with_version(&PROFILE_V1, 7);
        let err = check_profile(&r, &PROFILE_V1).unwrap_err();
        assert!(matches!(
            err,
            TranscodeError::StructuralMismatch { detected: DetectedVersion::V2, profile: FormatVersion::V1 }
        ));
        assert!(check_profile(&regions_with_version(&PROFILE_V2, 7), &PROFILE_V2).is_ok());
    }

    #[test]
    fn snapshot_reads_trainer_money_and_boxes() {
        let p = &PROFILE_V2;
        let mut r = regions_with_version(p, 0);

        let sb2 = &mut r[RegionName::Slot1SaveBlock2].data;
        sb2[..4].copy_from_slice(&[0xCC, 0xBF, 0xBE, 0xFF]);
        sb2[TRAINER_GENDER_OFFSET] = 1;
        LittleEndian::write_u32(&mut sb2[TRAINER_ID_OFFSET..], 0x1234_5678);
        LittleEndian::write_u16(&mut sb2[PLAY_HOURS_OFFSET..], 12);
        sb2[PLAY_MINUTES_OFFSET] = 34;
        LittleEndian::write_u32(&mut sb2[p.encryption_key_offset..], 0xAAAA_AAAA);

        let sb1 = &mut r[RegionName::Slot1SaveBlock1].data;
        LittleEndian::write_u32(&mut sb1[p.money_offset..], 1000 ^ 0xAAAA_AAAA);

        // box 2 slot 3: otId non-zero, all-zero payload otherwise
        let storage = &mut r[RegionName::Slot1PkmnStorage].data;
        let at = box_slot_offset(1, 2);
        LittleEndian::write_u32(&mut storage[at + 4..], 0x0000_0001);
        // empty sentinel in another slot
        let at = box_slot_offset(0, 0);
        LittleEndian::write_u32(&mut storage[at + 4..], 0xFFFF_FFFF);

        let snap = extract_snapshot(&r, p).unwrap();
        assert_eq!(snap.trainer.name, "RED");
        assert_eq!(snap.trainer.id, 0x1234_5678);
        assert_eq!(snap.trainer.gender, 1);
        assert_eq!(snap.stats, PlayStats { hours: 12, minutes: 34, money: 1000 });
        assert_eq!(snap.key, 0xAAAA_AAAA);
        assert!(snap.party.is_empty());
        assert_eq!(snap.boxes.len(), 1);
        assert_eq!((snap.boxes[0].box_number, snap.boxes[0].slot), (2, 3));
        assert!(snap.is_box_slot_occupied(2, 3));
    }

    #[test]
    fn party_count_is_clamped() {
        let p = &PROFILE_V1;
        let mut r = regions_with_version(p, VERSION_FIELD_V1);
        r[RegionName::Slot1SaveBlock1].data[PARTY_COUNT_OFFSET] = 200;
        let snap = extract_snapshot(&r, p).unwrap();
        assert_eq!(snap.party.len(), PARTY_SIZE);
    }
}
