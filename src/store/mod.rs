//! Sector store: flat image ⇄ logical regions.
//!
//! # Assembly
//! [`assemble`] walks the 32 sector frames in file order.  Each frame's id is
//! resolved through [`locate`]; the payload is copied into the target region
//! when the frame's counter is at least the region's current counter.  Ties
//! go to the frame scanned last, so of two copies of the same sector the
//! most recent write wins regardless of where the wear-leveling put it.
//!
//! # Serialization
//! [`serialize`] writes every region back in canonical id order.  Slot 1 gets
//! the next even counter; slot 2 is written empty, since only the game itself
//! populates the backup slot.  Auxiliary regions keep their ids only when
//! they were populated in the source image.

pub mod scanner;

use std::ops::{Index, IndexMut};

use tracing::{debug, warn};

use crate::profile::FormatProfile;
use crate::sector::{
    locate, RawSector, RegionName, SectorError, SectorFooter,
    EMPTY_SECTOR_ID, INVALID_SECURITY, SECTOR_SIGNATURE,
};
use scanner::{ChecksumStatus, ScanReport, ScannedSector, SectorHealth};

// ── Regions ──────────────────────────────────────────────────────────────────

/// Contiguous buffer reassembled from one or more sectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalRegion {
    pub data:           Vec<u8>,
    /// Counter of the most recently accepted contributing sector.
    pub counter:        u32,
    /// Security value of the most recently accepted contributing sector.
    pub security:       u32,
    pub sectors_merged: usize,
}

impl LogicalRegion {
    fn empty(name: RegionName, profile: &FormatProfile) -> Self {
        Self {
            data:           vec![0u8; name.sector_count() * profile.data_size],
            counter:        0,
            security:       INVALID_SECURITY,
            sectors_merged: 0,
        }
    }

    /// True once at least one sector was merged.
    pub fn is_populated(&self) -> bool {
        self.sectors_merged > 0
    }
}

/// Every region of one save image, indexed by [`RegionName`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSet {
    regions: Vec<LogicalRegion>,
}

impl RegionSet {
    /// Zero-filled regions with the invalid security sentinel.
    pub fn new(profile: &FormatProfile) -> Self {
        Self {
            regions: RegionName::ALL.iter().map(|&n| LogicalRegion::empty(n, profile)).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionName, &LogicalRegion)> {
        RegionName::ALL.iter().copied().zip(self.regions.iter())
    }

    /// Apply the recency rule for one sector.
    fn merge(&mut self, sector: &RawSector, profile: &FormatProfile) -> SectorHealth {
        let footer = sector.footer;
        if footer.id == EMPTY_SECTOR_ID {
            return SectorHealth::Empty;
        }
        let Some((name, position)) = locate(footer.id) else {
            return SectorHealth::UnknownId { id: footer.id };
        };

        let region = &mut self[name];
        if footer.counter < region.counter {
            return SectorHealth::Stale {
                region:         name,
                counter:        footer.counter,
                region_counter: region.counter,
            };
        }

        let start = position * profile.data_size;
        region.data[start..start + profile.data_size].copy_from_slice(&sector.payload);
        region.counter   = footer.counter;
        region.security  = footer.security;
        region.sectors_merged += 1;
        SectorHealth::Accepted { region: name, position }
    }
}

impl Index<RegionName> for RegionSet {
    type Output = LogicalRegion;

    fn index(&self, name: RegionName) -> &LogicalRegion {
        &self.regions[name.index()]
    }
}

impl IndexMut<RegionName> for RegionSet {
    fn index_mut(&mut self, name: RegionName) -> &mut LogicalRegion {
        &mut self.regions[name.index()]
    }
}

// ── Assembly ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Assembly {
    pub regions: RegionSet,
    pub report:  ScanReport,
}

/// Rebuild the logical regions of `image` under `profile`.
///
/// Fails only when the image is shorter than `32 × sector_size`; trailing
/// bytes past that length are ignored.
pub fn assemble(image: &[u8], profile: &FormatProfile) -> Result<Assembly, SectorError> {
    let required = profile.image_size();
    if image.len() < required {
        return Err(SectorError::TruncatedImage { actual: image.len(), required });
    }

    let mut regions = RegionSet::new(profile);
    let mut report  = ScanReport::default();

    for (index, frame) in image[..required].chunks_exact(profile.sector_size()).enumerate() {
        let sector = RawSector::parse(frame, profile)?;

        let computed = sector.computed_checksum();
        let checksum = if computed == sector.footer.checksum {
            ChecksumStatus::Valid
        } else {
            ChecksumStatus::Mismatch { stored: sector.footer.checksum, computed }
        };

        let health = regions.merge(&sector, profile);
        debug!(
            index,
            id = sector.footer.id,
            counter = sector.footer.counter,
            security = sector.footer.security,
            ?health,
            "scanned sector"
        );
        // Empty sectors are never written with a meaningful checksum.
        if health != SectorHealth::Empty {
            if let ChecksumStatus::Mismatch { stored, computed } = checksum {
                warn!(index, id = sector.footer.id, stored, computed, "sector checksum mismatch");
            }
        }

        report.record(ScannedSector {
            index,
            offset: index * profile.sector_size(),
            footer: sector.footer,
            health,
            checksum,
        });
    }

    Ok(Assembly { regions, report })
}

// ── Serialization ────────────────────────────────────────────────────────────

/// Next slot-1 counter: always even.
pub fn next_counter(current: u32) -> u32 {
    let counter = current.wrapping_add(1);
    if counter & 1 == 1 { counter.wrapping_add(1) } else { counter }
}

/// Write `regions` as a full save image.
pub fn serialize(regions: &RegionSet, profile: &FormatProfile) -> Result<Vec<u8>, SectorError> {
    let sb2 = &regions[RegionName::Slot1SaveBlock2];
    let counter = next_counter(sb2.counter);
    let slot1_security = if sb2.security == INVALID_SECURITY { SECTOR_SIGNATURE } else { sb2.security };

    let mut out = Vec::with_capacity(profile.image_size());
    let mut physical_id: u16 = 0;

    for (name, region) in regions.iter() {
        let (populated, security, sector_counter) = if name.is_slot1() {
            (true, slot1_security, counter)
        } else if name.is_slot2() {
            (false, INVALID_SECURITY, 0)
        } else {
            (region.security != INVALID_SECURITY, region.security, counter)
        };

        for chunk in region.data.chunks_exact(profile.data_size) {
            let mut sector = RawSector {
                footer: SectorFooter {
                    id:       if populated { physical_id } else { EMPTY_SECTOR_ID },
                    checksum: 0,
                    security,
                    counter:  sector_counter,
                },
                payload: chunk.to_vec(),
            };
            sector.write(&mut out, profile)?;
            physical_id += 1;
        }
    }

    debug!(counter, bytes = out.len(), "serialized save image");
    Ok(out)
}
