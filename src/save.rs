//! High-level [`SaveFile`] API, the primary embedding surface.
//!
//! ```no_run
//! use roguesav::save::SaveFile;
//! use roguesav::transcoder::Mutation;
//!
//! let mut save = SaveFile::read("Emerald Rogue.sav")?;
//! println!("{} has {} money", save.snapshot().trainer.name, save.snapshot().stats.money);
//!
//! save.apply(&Mutation { money: Some(5000), ..Mutation::default() })?;
//! save.write("Emerald Rogue.out.sav")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::profile::{FormatProfile, FormatVersion};
use crate::sector::SectorError;
use crate::store::scanner::ScanReport;
use crate::store::{self, RegionSet};
use crate::transcoder::{apply_mutation, extract_snapshot, GameStateSnapshot, Mutation, TranscodeError};

pub const BACKUP_SUFFIX: &str = ".bak";

#[derive(Debug)]
pub struct SaveFile {
    profile:  &'static FormatProfile,
    regions:  RegionSet,
    report:   ScanReport,
    snapshot: GameStateSnapshot,
}

impl SaveFile {
    // ── Constructors ─────────────────────────────────────────────────────────

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, TranscodeError> {
        let image = fs::read(path).map_err(SectorError::from)?;
        Self::open(&image)
    }

    /// Assemble `image`, trying the V1 profile first and falling back to V2
    /// once.  A truncated image is fatal for every profile.
    pub fn open(image: &[u8]) -> Result<Self, TranscodeError> {
        for profile in FormatProfile::candidates() {
            match Self::open_with_profile(image, profile) {
                Ok(save) => {
                    info!(version = %save.version(), "detected save format");
                    return Ok(save);
                }
                Err(TranscodeError::StructuralMismatch { detected, profile: tried }) => {
                    info!(%detected, %tried, "profile rejected, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(TranscodeError::UnrecognizedFormat)
    }

    pub fn open_with_profile(image: &[u8], profile: &'static FormatProfile) -> Result<Self, TranscodeError> {
        let assembly = store::assemble(image, profile)?;
        let snapshot = extract_snapshot(&assembly.regions, profile)?;
        Ok(Self {
            profile,
            regions: assembly.regions,
            report: assembly.report,
            snapshot,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn version(&self) -> FormatVersion {
        self.profile.version
    }

    pub fn profile(&self) -> &'static FormatProfile {
        self.profile
    }

    pub fn snapshot(&self) -> &GameStateSnapshot {
        &self.snapshot
    }

    /// Per-sector diagnostics from the original image.
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    // ── Mutation ─────────────────────────────────────────────────────────────

    /// Apply `mutation` and refresh the snapshot from the rewritten regions.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<(), TranscodeError> {
        let regions  = apply_mutation(&self.regions, self.profile, &self.snapshot, mutation)?;
        let snapshot = extract_snapshot(&regions, self.profile)?;
        self.regions  = regions;
        self.snapshot = snapshot;
        Ok(())
    }

    // ── Output ───────────────────────────────────────────────────────────────

    pub fn to_bytes(&self) -> Result<Vec<u8>, TranscodeError> {
        Ok(store::serialize(&self.regions, self.profile)?)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), TranscodeError> {
        let image = self.to_bytes()?;
        fs::write(path, image).map_err(SectorError::from)?;
        Ok(())
    }
}

/// Copy `path` to `<path>.bak` unless a backup already exists.
///
/// Returns the backup path when a copy was made.
pub fn backup_file<P: AsRef<Path>>(path: P) -> io::Result<Option<PathBuf>> {
    let path = path.as_ref();
    let mut name = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    let backup = PathBuf::from(name);

    if backup.exists() {
        return Ok(None);
    }
    fs::copy(path, &backup)?;
    info!(backup = %backup.display(), "created backup");
    Ok(Some(backup))
}
