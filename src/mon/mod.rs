//! Creature record codec.
//!
//! # Box record layout (80 bytes, little-endian)
//! ```text
//!  0  personality   u32
//!  4  trainer id    u32
//!  8  nickname      [u8; 10]
//! 18  language      u8   (V2: low 3 bits language, high 5 bits hidden nature)
//! 19  egg / species flags
//! 20  trainer name  [u8; 7]
//! 27  markings      u8
//! 28  checksum      u16  (record checksum of the plaintext sub-structures)
//! 30  reserved      u16
//! 32  sub-structures, permuted + XOR ciphered (see `substruct`)
//! ```
//! Party records share this prefix and append battle stats, which are not
//! interpreted here.
//!
//! A decoded [`PokemonRecord`] keeps the sub-structures in canonical order and
//! in plaintext; derived values (species, held item, ...) are read from them on
//! demand.  [`encode`] is the exact inverse of [`decode`] for an unmodified
//! record: same personality → same permutation, same key → same ciphertext,
//! and the checksum is always recomputed.

pub mod substruct;

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;
use thiserror::Error;

use crate::checksum::record_checksum;
use crate::profile::{FormatVersion, BOX_MON_SIZE, SHINY_ODDS, SPECIES_COUNT_V1, SPECIES_COUNT_V2};
use crate::text;
use substruct::{
    apply_cipher, shuffle, unshuffle, Substructs,
    ATTACKS, CONDITIONS, GROWTH, MISC, SUBSTRUCT_BYTES, SUBSTRUCT_OFFSET,
};

pub const NICKNAME_LENGTH:     usize = 10;
pub const TRAINER_NAME_LENGTH: usize = 7;

const SPECIES_MASK:    u32 = 0x7FF;
const HELD_ITEM_SHIFT: u32 = 11;
const V2_SHINY_BIT:    u32 = 1;

#[derive(Error, Debug)]
pub enum MonError {
    #[error("Record truncated: {actual} bytes, need {BOX_MON_SIZE}")]
    Truncated { actual: usize },
}

// ── PokemonRecord ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PokemonRecord {
    /// Layout the record was decoded from.
    pub format:                 FormatVersion,
    pub personality:            u32,
    pub trainer_id:             u32,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub nickname_raw:           [u8; NICKNAME_LENGTH],
    pub nickname:               String,
    pub language:               u8,
    /// Always 0 for V1 records.
    pub hidden_nature_modifier: u8,
    pub egg_species:            u8,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub trainer_name_raw:       [u8; TRAINER_NAME_LENGTH],
    pub trainer_name:           String,
    pub markings:               u8,
    /// Checksum as found on disk.
    pub checksum:               u16,
    pub reserved:               u16,
    /// Canonical order, plaintext.
    #[serde(skip)]
    pub substructs:             Substructs,
    pub shiny:                  bool,
    pub cipher_key:             u32,
}

impl PokemonRecord {
    pub fn species(&self) -> u16 {
        (LittleEndian::read_u16(&self.substructs[GROWTH][0..2]) as u32 & SPECIES_MASK) as u16
    }

    pub fn held_item(&self) -> u16 {
        match self.format {
            FormatVersion::V1 => LittleEndian::read_u16(&self.substructs[GROWTH][2..4]),
            FormatVersion::V2 => (LittleEndian::read_u32(&self.substructs[GROWTH][0..4]) >> HELD_ITEM_SHIFT) as u16,
        }
    }

    pub fn experience(&self) -> u32 {
        LittleEndian::read_u32(&self.substructs[GROWTH][4..8])
    }

    pub fn pp(&self) -> u8 {
        self.substructs[ATTACKS][8]
    }

    pub fn attack_ev(&self) -> u8 {
        self.substructs[CONDITIONS][1]
    }

    pub fn met_level(&self) -> u8 {
        (LittleEndian::read_u16(&self.substructs[MISC][2..4]) & 0x7F) as u8
    }

    /// Checksum the plaintext sub-structures should carry.
    pub fn computed_checksum(&self) -> u16 {
        record_checksum(self.substructs.concat().as_slice())
    }

    pub fn has_valid_checksum(&self) -> bool {
        self.checksum == self.computed_checksum()
    }
}

/// Box slots whose trainer id is 0 or all-ones hold no record.
pub fn is_empty_slot(raw: &[u8]) -> bool {
    match raw.get(4..8) {
        Some(id) => matches!(LittleEndian::read_u32(id), 0 | 0xFFFF_FFFF),
        None     => true,
    }
}

// ── Shiny derivation ─────────────────────────────────────────────────────────
//
// The two layouts disagree on where shininess comes from and are kept as
// separate paths.

/// V1: derived from the ids.
pub fn shiny_from_ids(trainer_id: u32, personality: u32) -> bool {
    let x = (trainer_id >> 16) ^ (trainer_id & 0xFFFF) ^ (personality >> 16) ^ (personality & 0xFFFF);
    x < SHINY_ODDS
}

/// V2: explicit flag in the miscellaneous sub-structure.
pub fn shiny_from_flag(substructs: &Substructs) -> bool {
    LittleEndian::read_u32(&substructs[MISC][8..12]) & V2_SHINY_BIT != 0
}

// ── Decode ───────────────────────────────────────────────────────────────────

/// Decode the first 80 bytes of `raw` as a record of layout `format`.
pub fn decode(raw: &[u8], format: FormatVersion) -> Result<PokemonRecord, MonError> {
    if raw.len() < BOX_MON_SIZE {
        return Err(MonError::Truncated { actual: raw.len() });
    }

    let personality = LittleEndian::read_u32(&raw[0..4]);
    let trainer_id  = LittleEndian::read_u32(&raw[4..8]);
    let cipher_key  = trainer_id ^ personality;

    let mut nickname_raw = [0u8; NICKNAME_LENGTH];
    nickname_raw.copy_from_slice(&raw[8..18]);
    let mut trainer_name_raw = [0u8; TRAINER_NAME_LENGTH];
    trainer_name_raw.copy_from_slice(&raw[20..27]);

    let (language, hidden_nature_modifier) = match format {
        FormatVersion::V1 => (raw[18], 0),
        FormatVersion::V2 => (raw[18] & 0x7, raw[18] >> 3),
    };

    let mut physical = [0u8; SUBSTRUCT_BYTES];
    physical.copy_from_slice(&raw[SUBSTRUCT_OFFSET..SUBSTRUCT_OFFSET + SUBSTRUCT_BYTES]);
    let mut substructs = unshuffle(&physical, personality);
    for block in substructs.iter_mut() {
        apply_cipher(block, cipher_key);
    }

    let shiny = match format {
        FormatVersion::V1 => shiny_from_ids(trainer_id, personality),
        FormatVersion::V2 => shiny_from_flag(&substructs),
    };

    Ok(PokemonRecord {
        format,
        personality,
        trainer_id,
        nickname: text::decode(&nickname_raw),
        nickname_raw,
        language,
        hidden_nature_modifier,
        egg_species: raw[19],
        trainer_name: text::decode(&trainer_name_raw),
        trainer_name_raw,
        markings: raw[27],
        checksum: LittleEndian::read_u16(&raw[28..30]),
        reserved: LittleEndian::read_u16(&raw[30..32]),
        substructs,
        shiny,
        cipher_key,
    })
}

// ── Encode ───────────────────────────────────────────────────────────────────

/// V1 growth / misc data rewritten for the V2 layout.
fn transcode_v1_to_v2(record: &PokemonRecord, substructs: &mut Substructs) {
    let mut species = LittleEndian::read_u16(&substructs[GROWTH][0..2]) as u32;
    if species > SPECIES_COUNT_V1 as u32 {
        species += (SPECIES_COUNT_V2 - SPECIES_COUNT_V1) as u32;
    }
    // Item ids do not line up between layouts.
    let held_item = 0u32;
    LittleEndian::write_u32(&mut substructs[GROWTH][0..4], (species & SPECIES_MASK) | (held_item << HELD_ITEM_SHIFT));

    if record.shiny {
        let flags = LittleEndian::read_u32(&substructs[MISC][8..12]) | V2_SHINY_BIT;
        LittleEndian::write_u32(&mut substructs[MISC][8..12], flags);
    }
}

/// Encode `record` as an 80-byte box record in layout `target`.
///
/// With `new_trainer_id`, the record is re-owned: the stored id changes and
/// the cipher key is adjusted by XORing the old id out and the new one in.
pub fn encode(record: &PokemonRecord, target: FormatVersion, new_trainer_id: Option<u32>) -> [u8; BOX_MON_SIZE] {
    let (trainer_id, cipher_key) = match new_trainer_id {
        Some(id) if id != record.trainer_id => (id, record.cipher_key ^ record.trainer_id ^ id),
        _ => (record.trainer_id, record.cipher_key),
    };

    let mut substructs = record.substructs;
    if record.format == FormatVersion::V1 && target == FormatVersion::V2 {
        transcode_v1_to_v2(record, &mut substructs);
    }

    let mut out = [0u8; BOX_MON_SIZE];
    LittleEndian::write_u32(&mut out[0..4], record.personality);
    LittleEndian::write_u32(&mut out[4..8], trainer_id);
    out[8..18].copy_from_slice(&record.nickname_raw);
    out[18] = match target {
        FormatVersion::V1 => record.language,
        FormatVersion::V2 => (record.language & 0x7) | (record.hidden_nature_modifier << 3),
    };
    out[19] = record.egg_species;
    out[20..27].copy_from_slice(&record.trainer_name_raw);
    out[27] = record.markings;
    LittleEndian::write_u16(&mut out[30..32], record.reserved);

    let mut physical = shuffle(&substructs, record.personality);
    LittleEndian::write_u16(&mut out[28..30], record_checksum(&physical));
    apply_cipher(&mut physical, cipher_key);
    out[SUBSTRUCT_OFFSET..].copy_from_slice(&physical);
    out
}
