use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use serde::Serialize;
use thiserror::Error;

use crate::checksum::sector_checksum;
use crate::profile::FormatProfile;

/// Footer id of a sector that carries no data.
pub const EMPTY_SECTOR_ID:  u16 = 0xFFFF;
/// Security value of a region that was never written.
pub const INVALID_SECURITY: u32 = 0xFFFF_FFFF;
/// Security value the game writes into every valid sector.
pub const SECTOR_SIGNATURE: u32 = 0x0801_2025;

#[derive(Error, Debug)]
pub enum SectorError {
    #[error("Save image truncated: {actual} bytes, need at least {required}")]
    TruncatedImage { actual: usize, required: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Regions ──────────────────────────────────────────────────────────────────

/// Logical structures reassembled from sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RegionName {
    Slot1SaveBlock2,
    Slot1SaveBlock1,
    Slot1PkmnStorage,
    Slot2SaveBlock2,
    Slot2SaveBlock1,
    Slot2PkmnStorage,
    HallOfFame,
    TrainerHill,
    RecordedBattle,
}

impl RegionName {
    /// All regions, in canonical write order.
    pub const ALL: [RegionName; 9] = [
        RegionName::Slot1SaveBlock2,
        RegionName::Slot1SaveBlock1,
        RegionName::Slot1PkmnStorage,
        RegionName::Slot2SaveBlock2,
        RegionName::Slot2SaveBlock1,
        RegionName::Slot2PkmnStorage,
        RegionName::HallOfFame,
        RegionName::TrainerHill,
        RegionName::RecordedBattle,
    ];

    pub fn sector_count(self) -> usize {
        match self {
            RegionName::Slot1SaveBlock2  | RegionName::Slot2SaveBlock2  => 1,
            RegionName::Slot1SaveBlock1  | RegionName::Slot2SaveBlock1  => 4,
            RegionName::Slot1PkmnStorage | RegionName::Slot2PkmnStorage => 9,
            RegionName::HallOfFame                                      => 2,
            RegionName::TrainerHill      | RegionName::RecordedBattle   => 1,
        }
    }

    pub fn is_slot1(self) -> bool {
        matches!(
            self,
            RegionName::Slot1SaveBlock2 | RegionName::Slot1SaveBlock1 | RegionName::Slot1PkmnStorage
        )
    }

    pub fn is_slot2(self) -> bool {
        matches!(
            self,
            RegionName::Slot2SaveBlock2 | RegionName::Slot2SaveBlock1 | RegionName::Slot2PkmnStorage
        )
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            RegionName::Slot1SaveBlock2  => "SLOT1_SAVEBLOCK2",
            RegionName::Slot1SaveBlock1  => "SLOT1_SAVEBLOCK1",
            RegionName::Slot1PkmnStorage => "SLOT1_PKMNSTORAGE",
            RegionName::Slot2SaveBlock2  => "SLOT2_SAVEBLOCK2",
            RegionName::Slot2SaveBlock1  => "SLOT2_SAVEBLOCK1",
            RegionName::Slot2PkmnStorage => "SLOT2_PKMNSTORAGE",
            RegionName::HallOfFame       => "HOF",
            RegionName::TrainerHill      => "TRAINERHILL",
            RegionName::RecordedBattle   => "RECORDEDBATTLE",
        }
    }
}

/// Resolve a footer id to `(region, sector index within region)`.
///
/// Ids 0..=13 belong to slot 1, 14..=27 to slot 2 (same order), 28..=31 to
/// the auxiliary regions.  Anything else, including [`EMPTY_SECTOR_ID`],
/// resolves to `None`.
pub fn locate(id: u16) -> Option<(RegionName, usize)> {
    let slot_local = |base: u16, sb2: RegionName, sb1: RegionName, storage: RegionName| match id - base {
        0           => Some((sb2, 0)),
        n @ 1..=4   => Some((sb1, (n - 1) as usize)),
        n @ 5..=13  => Some((storage, (n - 5) as usize)),
        _           => None,
    };
    match id {
        0..=13  => slot_local(0, RegionName::Slot1SaveBlock2, RegionName::Slot1SaveBlock1, RegionName::Slot1PkmnStorage),
        14..=27 => slot_local(14, RegionName::Slot2SaveBlock2, RegionName::Slot2SaveBlock1, RegionName::Slot2PkmnStorage),
        28      => Some((RegionName::HallOfFame, 0)),
        29      => Some((RegionName::HallOfFame, 1)),
        30      => Some((RegionName::TrainerHill, 0)),
        31      => Some((RegionName::RecordedBattle, 0)),
        _       => None,
    }
}

// ── Footer ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectorFooter {
    pub id:       u16,
    pub checksum: u16,
    pub security: u32,
    pub counter:  u32,
}

impl SectorFooter {
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.id)?;
        writer.write_u16::<LittleEndian>(self.checksum)?;
        writer.write_u32::<LittleEndian>(self.security)?;
        writer.write_u32::<LittleEndian>(self.counter)?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        Ok(Self {
            id:       reader.read_u16::<LittleEndian>()?,
            checksum: reader.read_u16::<LittleEndian>()?,
            security: reader.read_u32::<LittleEndian>()?,
            counter:  reader.read_u32::<LittleEndian>()?,
        })
    }
}

// ── RawSector ────────────────────────────────────────────────────────────────

/// One physical sector frame.
#[derive(Debug, Clone)]
pub struct RawSector {
    pub footer:  SectorFooter,
    pub payload: Vec<u8>,
}

impl RawSector {
    /// Split a frame of exactly `profile.sector_size()` bytes.  Padding
    /// between payload and footer is ignored.
    pub fn parse(frame: &[u8], profile: &FormatProfile) -> io::Result<Self> {
        if frame.len() < profile.sector_size() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short sector frame"));
        }
        let payload = frame[..profile.data_size].to_vec();
        let footer_start = profile.data_size + profile.footer_padding();
        let footer = SectorFooter::read(&frame[footer_start..profile.sector_size()])?;
        Ok(Self { footer, payload })
    }

    pub fn computed_checksum(&self) -> u16 {
        sector_checksum(&self.payload)
    }

    /// Write payload, zero padding and footer.  The checksum is recomputed
    /// from the payload immediately before the footer goes out.
    pub fn write<W: Write>(&mut self, mut writer: W, profile: &FormatProfile) -> io::Result<()> {
        self.footer.checksum = self.computed_checksum();
        writer.write_all(&self.payload)?;
        writer.write_all(&vec![0u8; profile.footer_padding()])?;
        self.footer.write(&mut writer)
    }
}
