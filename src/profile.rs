//! Per-version layout constants.
//!
//! Two save layouts exist: the 1.3.2 layout (V1) and the 2.0 layout (V2).
//! Everything that differs between them lives in an immutable
//! [`FormatProfile`]; everything shared is a plain constant below.  Profiles
//! are passed by reference through every call, there is no global state.
//!
//! # Sector frame
//! ```text
//! V1: [ payload 3968 B | pad 116 B | id u16 | checksum u16 | security u32 | counter u32 ]
//! V2: [ payload 4084 B |             id u16 | checksum u16 | security u32 | counter u32 ]
//! ```
//! Both frames are 4096 bytes; only the payload length differs.

use serde::Serialize;

/// Number of physical sectors in a save image.
pub const NSECTORS:             usize = 32;
/// id + checksum + security + counter.
pub const FOOTER_FIELDS_SIZE:   usize = 12;

/// u16 in SAVEBLOCK1 that tells the layouts apart.
pub const VERSION_FIELD_OFFSET: usize = 2498;
/// Value of the version field written by 1.3.2 and earlier.
pub const VERSION_FIELD_V1:     u16   = 4;

pub const PARTY_COUNT_OFFSET:   usize = 0x234;
pub const PARTY_OFFSET:         usize = 0x238;
pub const PARTY_SIZE:           usize = 6;
pub const PC_ITEMS_COUNT:       usize = 50;

/// Boxed record size; party records extend it with battle stats.
pub const BOX_MON_SIZE:         usize = 80;
pub const BOX_STORAGE_OFFSET:   usize = 4;
pub const TOTAL_BOXES:          usize = 10;
pub const MONS_PER_BOX:         usize = 30;

pub const PLAYER_NAME_LENGTH:   usize = 7;
pub const TRAINER_GENDER_OFFSET:  usize = PLAYER_NAME_LENGTH + 1;
pub const TRAINER_ID_OFFSET:      usize = TRAINER_GENDER_OFFSET + 2;
pub const PLAY_HOURS_OFFSET:      usize = TRAINER_ID_OFFSET + 4;
pub const PLAY_MINUTES_OFFSET:    usize = PLAY_HOURS_OFFSET + 2;

pub const SPECIES_COUNT_V1:     u16   = 898;
pub const SPECIES_COUNT_V2:     u16   = 905;

/// 1-in-8192 style threshold used by the V1 shiny formula.
pub const SHINY_ODDS:           u32   = 655;

// ── FormatVersion ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FormatVersion {
    /// 1.3.2 and earlier.
    V1,
    /// 2.0 and later.
    V2,
}

impl FormatVersion {
    pub fn name(self) -> &'static str {
        match self {
            FormatVersion::V1 => "1.3.2",
            FormatVersion::V2 => "2.0",
        }
    }

    pub fn profile(self) -> &'static FormatProfile {
        match self {
            FormatVersion::V1 => &PROFILE_V1,
            FormatVersion::V2 => &PROFILE_V2,
        }
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── FormatProfile ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatProfile {
    pub version:               FormatVersion,
    pub data_size:             usize,
    pub footer_size:           usize,
    /// Party record size (box record + battle stats).
    pub mon_struct_size:       usize,
    /// Offset of the global XOR key inside SAVEBLOCK2.
    pub encryption_key_offset: usize,
    pub money_offset:          usize,
    pub items_offset:          usize,
    pub bag_capacity:          usize,
    pub dex_seen_offset:       usize,
    /// Length in bytes of each of the seen / caught masks.
    pub dex_size:              usize,
    pub species_count:         u16,
}

const fn money_offset(mon_struct_size: usize) -> usize {
    PARTY_OFFSET + PARTY_SIZE * mon_struct_size
}

const fn items_offset(mon_struct_size: usize) -> usize {
    money_offset(mon_struct_size) + 4 + 4 + PC_ITEMS_COUNT * 4
}

pub const PROFILE_V1: FormatProfile = FormatProfile {
    version:               FormatVersion::V1,
    data_size:             3968,
    footer_size:           128,
    mon_struct_size:       100,
    encryption_key_offset: 0xAC,
    money_offset:          money_offset(100),
    items_offset:          items_offset(100),
    bag_capacity:          30 + 30 + 16 + 64 + 46,
    dex_seen_offset:       0x3598,
    dex_size:              113,
    species_count:         SPECIES_COUNT_V1,
};

pub const PROFILE_V2: FormatProfile = FormatProfile {
    version:               FormatVersion::V2,
    data_size:             4084,
    footer_size:           FOOTER_FIELDS_SIZE,
    mon_struct_size:       104,
    encryption_key_offset: 0x4C,
    money_offset:          money_offset(104),
    items_offset:          items_offset(104),
    bag_capacity:          450,
    dex_seen_offset:       0x30B4,
    dex_size:              191,
    species_count:         SPECIES_COUNT_V2,
};

impl FormatProfile {
    /// Profiles in the order they are tried when opening an unknown image.
    pub fn candidates() -> [&'static FormatProfile; 2] {
        [FormatVersion::V1.profile(), FormatVersion::V2.profile()]
    }

    pub const fn sector_size(&self) -> usize {
        self.data_size + self.footer_size
    }

    /// Minimum image length accepted by the sector store.
    pub const fn image_size(&self) -> usize {
        NSECTORS * self.sector_size()
    }

    /// Unused bytes between payload and footer fields.
    pub const fn footer_padding(&self) -> usize {
        self.footer_size - FOOTER_FIELDS_SIZE
    }

    pub const fn pc_items_offset(&self) -> usize {
        self.money_offset + 8
    }

    pub const fn dex_caught_offset(&self) -> usize {
        self.dex_seen_offset + self.dex_size
    }
}
