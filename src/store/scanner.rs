//! Per-sector diagnostics collected while a save image is assembled.
//!
//! Assembly never fails because of an individual sector.  Every frame gets a
//! [`SectorHealth`] verdict and a [`ChecksumStatus`]; both end up in a
//! [`ScanReport`] so callers can see which copies were used, which were
//! stale, and which carried a bad checksum.
//!
//! Checksums are reported, never enforced: a mismatching sector is still
//! merged if its id and counter qualify.

use serde::Serialize;

use crate::sector::{RegionName, SectorFooter};

/// Verdict for one scanned sector frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SectorHealth {
    /// Merged into `region` at sector position `position`.
    Accepted { region: RegionName, position: usize },
    /// Counter lower than the one already stored for the region.
    Stale { region: RegionName, counter: u32, region_counter: u32 },
    /// Footer id is the empty sentinel.
    Empty,
    /// Footer id outside the known table.
    UnknownId { id: u16 },
}

impl SectorHealth {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SectorHealth::Accepted { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChecksumStatus {
    Valid,
    Mismatch { stored: u16, computed: u16 },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScannedSector {
    /// Physical position in the image (0..32).
    pub index:    usize,
    /// Byte offset of the frame.
    pub offset:   usize,
    pub footer:   SectorFooter,
    pub health:   SectorHealth,
    pub checksum: ChecksumStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub sectors:             Vec<ScannedSector>,
    pub accepted:            usize,
    pub stale:               usize,
    pub empty:               usize,
    pub unknown:             usize,
    pub checksum_mismatches: usize,
}

impl ScanReport {
    pub(crate) fn record(&mut self, sector: ScannedSector) {
        match sector.health {
            SectorHealth::Accepted { .. }  => self.accepted += 1,
            SectorHealth::Stale { .. }     => self.stale += 1,
            SectorHealth::Empty            => self.empty += 1,
            SectorHealth::UnknownId { .. } => self.unknown += 1,
        }
        if matches!(sector.checksum, ChecksumStatus::Mismatch { .. }) {
            self.checksum_mismatches += 1;
        }
        self.sectors.push(sector);
    }

    pub fn total(&self) -> usize {
        self.sectors.len()
    }

    /// Sectors whose stored checksum disagrees with the payload.
    pub fn mismatches(&self) -> impl Iterator<Item = &ScannedSector> {
        self.sectors
            .iter()
            .filter(|s| matches!(s.checksum, ChecksumStatus::Mismatch { .. }))
    }

    pub fn summary(&self) -> String {
        format!(
            "{} sectors: {} accepted, {} stale, {} empty, {} unknown id, {} checksum mismatch(es)",
            self.total(),
            self.accepted,
            self.stale,
            self.empty,
            self.unknown,
            self.checksum_mismatches,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanned(index: usize, health: SectorHealth, checksum: ChecksumStatus) -> ScannedSector {
        ScannedSector {
            index,
            offset: index * 4096,
            footer: SectorFooter { id: index as u16, checksum: 0, security: 0, counter: 1 },
            health,
            checksum,
        }
    }

    #[test]
    fn record_tallies_verdicts_and_mismatches() {
        let bad = ChecksumStatus::Mismatch { stored: 1, computed: 2 };
        let mut report = ScanReport::default();
        report.record(scanned(0, SectorHealth::Accepted { region: RegionName::Slot1SaveBlock2, position: 0 }, bad));
        report.record(scanned(1, SectorHealth::Empty, bad));
        report.record(scanned(2, SectorHealth::UnknownId { id: 77 }, ChecksumStatus::Valid));

        assert_eq!((report.total(), report.accepted, report.empty, report.unknown), (3, 1, 1, 1));
        assert_eq!(report.checksum_mismatches, 2);

        let flagged: Vec<usize> = report.mismatches().map(|s| s.index).collect();
        assert_eq!(flagged, vec![0, 1]);
        let used: Vec<usize> = report.mismatches().filter(|s| s.health.is_accepted()).map(|s| s.index).collect();
        assert_eq!(used, vec![0]);
        assert!(report.summary().starts_with("3 sectors: 1 accepted"));
    }
}
