//! KEEPSAKE - Storage Engine Module
//! Top-level module for the region store: directory operations over a
//! pending log, and the save/restore protocol over a single container file.

pub mod codec;
pub mod concurrent;
pub mod container;
pub mod metrics;
pub mod region;
pub mod staging;
pub mod version;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{KeepsakeError, Result};
use crate::types::{canonical_name, is_valid_region_name};

use self::container::LoadReport;
use self::metrics::EngineMetrics;
use self::region::Region;
use self::staging::{PendingLog, PendingOperation};

/// The core Keepsake storage engine.
///
/// Reads always see the committed table with every staged operation applied.
/// Disk only changes on [`Keepsake::save`] and [`Keepsake::restore`]; no file
/// handle is held between calls.
///
/// The engine assumes it is the only writer of its file. Two engines over the
/// same path are not coordinated.
pub struct Keepsake {
    /// Regions as of the last successful load or save, keyed by canonical name.
    regions: BTreeMap<String, Region>,
    /// Staged operations not yet written.
    pending: PendingLog,
    /// Engine metrics.
    metrics: EngineMetrics,
    /// Engine configuration.
    config: Config,
    /// `regions` holds changes the live file does not have yet.
    dirty: bool,
    /// The live file was rotated to `.bak` but its replacement is not
    /// complete; `.bak` is the only good copy.
    rotated: bool,
}

impl Keepsake {
    /// Open the store described by `config`, creating a header-only file if
    /// none exists yet.
    ///
    /// Fails with `InvalidFile` if the existing file is too short to hold a header.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        config
            .ensure_dirs()
            .map_err(|e| KeepsakeError::file_op("create directory", &config.data_dir, e))?;

        let path = config.file_path();
        if !path.exists() {
            container::create(&path, config.version, &BTreeMap::new(), config.sync_writes)?;
            log::info!("Created empty store file {:?}", path);
        }

        let (regions, report) = container::load(&path)?;
        let metrics = EngineMetrics::new();
        metrics.record_load(&report);
        log_load(&path, &regions, &report);

        Ok(Self {
            regions,
            pending: PendingLog::new(),
            metrics,
            config,
            dirty: false,
            rotated: false,
        })
    }

    /// Path of the live store file.
    pub fn path(&self) -> PathBuf {
        self.config.file_path()
    }

    /// The configuration this engine was opened with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a reference to the engine metrics.
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Number of staged operations waiting for `save`.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Names of every region currently visible, staged changes included.
    pub fn list_regions(&self) -> BTreeSet<String> {
        self.pending.effective_names(self.regions.keys())
    }

    /// Look up a region by case-insensitive name.
    /// The most recent staged operation for that name wins over committed state.
    pub fn get_region(&self, name: &str) -> Option<&Region> {
        let name = canonical_name(name);
        match self.pending.resolve(&name) {
            Some(decision) => decision,
            None => self.regions.get(&name),
        }
    }

    /// Returns true if a region with this case-insensitive name is visible.
    /// Useful to tell why `add_region` or `remove_region` returned `false`.
    pub fn region_exists(&self, name: &str) -> bool {
        self.get_region(name).is_some()
    }

    /// Stage a new, empty region.
    ///
    /// Returns `false` if the name is empty, uses characters other than ASCII
    /// letters, digits, `-`, `_`, `?` and `!`, or already exists.
    pub fn add_region(&mut self, name: &str) -> bool {
        if !is_valid_region_name(name) {
            log::debug!("Rejected region name {:?}: illegal characters", name);
            self.metrics.record_rejected();
            return false;
        }
        if self.region_exists(name) {
            log::debug!("Rejected add of region {:?}: already exists", name);
            self.metrics.record_rejected();
            return false;
        }

        let region = Region::new(name);
        log::debug!("Staged add of region {}", region.name());
        self.pending.push(PendingOperation::Upsert(region));
        self.metrics.record_add();
        true
    }

    /// Stage `region` as the new contents of the region with the same name.
    /// Returns `false` if no such region exists.
    pub fn replace_region(&mut self, region: Region) -> bool {
        if !self.region_exists(region.name()) {
            log::debug!("Rejected replace of region {}: not found", region.name());
            self.metrics.record_rejected();
            return false;
        }

        log::debug!(
            "Staged replace of region {} ({} records)",
            region.name(),
            region.len()
        );
        self.pending.push(PendingOperation::Upsert(region));
        self.metrics.record_replace();
        true
    }

    /// Stage removal of a region. Returns `false` if it does not exist.
    pub fn remove_region(&mut self, name: &str) -> bool {
        if !self.region_exists(name) {
            log::debug!("Rejected remove of region {:?}: not found", name);
            self.metrics.record_rejected();
            return false;
        }

        let name = canonical_name(name);
        log::debug!("Staged remove of region {}", name);
        self.pending.push(PendingOperation::Delete(name));
        self.metrics.record_remove();
        true
    }

    /// Commit every staged operation.
    ///
    /// ## Protocol
    /// 1. Replay the pending log into the committed table and clear it
    /// 2. Delete any existing `.bak`
    /// 3. Rename the live file to `.bak`
    /// 4. Create a fresh live file and write header plus one zone per region
    ///
    /// A failure after step 3 leaves the previous state in `.bak` while the
    /// live file may be missing or partial. Until a save completes, later saves
    /// keep that `.bak` untouched and only rewrite the live file, even when no
    /// new operations were staged. Steps 2 and 3 are also skipped when the live
    /// file is missing, so an existing `.bak` is never thrown away for nothing.
    /// Does nothing when no operations are staged and the file is current.
    pub fn save(&mut self) -> Result<()> {
        if self.pending.is_empty() && !self.dirty {
            return Ok(());
        }

        let staged = self.pending.len();
        self.pending.apply_to(&mut self.regions);
        self.dirty = true;

        let path = self.config.file_path();
        let backup = self.config.backup_path();

        if self.rotated {
            if path.exists() {
                log::warn!("Discarding incomplete live file {:?}", path);
                fs::remove_file(&path)
                    .map_err(|e| KeepsakeError::file_op("delete incomplete", &path, e))?;
            }
        } else if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup)
                    .map_err(|e| KeepsakeError::file_op("delete backup", &backup, e))?;
            }
            fs::rename(&path, &backup)
                .map_err(|e| KeepsakeError::file_op("rename to backup", &path, e))?;
            self.rotated = true;
        } else {
            log::warn!("Live file {:?} missing, keeping existing backup", path);
            self.rotated = true;
        }

        container::create(&path, self.config.version, &self.regions, self.config.sync_writes)?;
        self.rotated = false;
        self.dirty = false;

        self.metrics.record_save();
        log::info!(
            "Saved {} staged operations ({} regions) to {:?}",
            staged,
            self.regions.len(),
            path
        );
        Ok(())
    }

    /// Discard every staged operation and reload the last durable state.
    ///
    /// Requires a `.bak` from a previous save, failing with `BackupNotFound`
    /// otherwise (staged operations are discarded either way). The live file
    /// is reloaded when readable. If it is missing or has no valid header, as
    /// after an interrupted save, the backup is parsed first and only then
    /// promoted to be the live file, so a corrupt backup never costs the live file.
    /// After an interrupted save the live file is always treated as unusable.
    pub fn restore(&mut self) -> Result<()> {
        let discarded = self.pending.len();
        self.pending.clear();

        let path = self.config.file_path();
        let backup = self.config.backup_path();
        if !backup.exists() {
            return Err(KeepsakeError::BackupNotFound(backup));
        }

        let (regions, report) = match container::load(&path) {
            Ok(_) if self.rotated => {
                log::warn!("Live file {:?} is incomplete, rolling back to backup", path);
                promote_backup(&path, &backup)?
            }
            Ok(loaded) => loaded,
            Err(e) if is_unusable(&e) => {
                log::warn!("Live file {:?} unusable ({}), rolling back to backup", path, e);
                promote_backup(&path, &backup)?
            }
            Err(e) => return Err(e),
        };

        self.metrics.record_load(&report);
        log_load(&path, &regions, &report);
        self.regions = regions;
        self.dirty = false;
        self.rotated = false;
        self.metrics.record_restore();
        log::info!("Restored {:?}, discarded {} staged operations", path, discarded);
        Ok(())
    }
}

/// A live file that cannot be used at all, as opposed to a failing disk.
fn is_unusable(err: &KeepsakeError) -> bool {
    match err {
        KeepsakeError::InvalidFile(_) => true,
        KeepsakeError::FileOperation { source, .. } => source.kind() == ErrorKind::NotFound,
        _ => false,
    }
}

fn promote_backup(path: &Path, backup: &Path) -> Result<(BTreeMap<String, Region>, LoadReport)> {
    let loaded = container::load(backup)?;

    if path.exists() {
        fs::remove_file(path).map_err(|e| KeepsakeError::file_op("delete", path, e))?;
    }
    fs::rename(backup, path)
        .map_err(|e| KeepsakeError::file_op("rename backup to", path, e))?;
    Ok(loaded)
}

fn log_load(path: &Path, regions: &BTreeMap<String, Region>, report: &LoadReport) {
    log::info!(
        "Loaded {:?}: {} regions, format {}",
        path,
        regions.len(),
        report.declared_version
    );
    if report.zones_skipped > 0 || report.entries_discarded > 0 {
        log::warn!(
            "{:?}: skipped {} unreadable zones and {} unreadable entries",
            path,
            report.zones_skipped,
            report.entries_discarded
        );
    }
}
