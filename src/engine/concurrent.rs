//! KEEPSAKE - Concurrent Engine Wrapper
//! Thread-safe wrapper around the Keepsake engine using Arc + RwLock.
//!
//! ## Concurrency Model
//! - **Read operations** (`list_regions`, `get_region`, `region_exists`) acquire a **read lock**
//! - **Write operations** (`add`, `replace`, `remove`, `save`, `restore`) acquire a **write lock**
//!
//! The single-writer semantics of the engine are unchanged: every handle
//! shares one engine and one pending log.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::error::Result;

use super::metrics::EngineMetrics;
use super::region::Region;
use super::Keepsake;

/// Cloneable, thread-safe handle to one Keepsake store.
///
/// ## Example
/// ```no_run
/// use keepsake::engine::concurrent::SharedKeepsake;
/// use keepsake::config::Config;
/// use std::thread;
///
/// let store = SharedKeepsake::open(Config::new("./data", "shared")).unwrap();
/// let writer = store.clone();
///
/// thread::spawn(move || {
///     writer.add_region("events");
///     writer.save().unwrap();
/// })
/// .join()
/// .unwrap();
///
/// assert!(store.region_exists("EVENTS"));
/// ```
#[derive(Clone)]
pub struct SharedKeepsake {
    inner: Arc<RwLock<Keepsake>>,
}

impl SharedKeepsake {
    /// Open or create a shared Keepsake store.
    pub fn open(config: Config) -> Result<Self> {
        Ok(Self::from_engine(Keepsake::open(config)?))
    }

    /// Wrap an already opened engine.
    pub fn from_engine(engine: Keepsake) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    // Poisoned locks are recovered: no engine method panics mid-mutation.
    fn read(&self) -> RwLockReadGuard<'_, Keepsake> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Keepsake> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Visible region names (read lock).
    pub fn list_regions(&self) -> BTreeSet<String> {
        self.read().list_regions()
    }

    /// Snapshot of a visible region (read lock).
    pub fn get_region(&self, name: &str) -> Option<Region> {
        self.read().get_region(name).cloned()
    }

    /// Whether a region is visible (read lock).
    pub fn region_exists(&self, name: &str) -> bool {
        self.read().region_exists(name)
    }

    /// Stage a new region (write lock).
    pub fn add_region(&self, name: &str) -> bool {
        self.write().add_region(name)
    }

    /// Stage a region replacement (write lock).
    pub fn replace_region(&self, region: Region) -> bool {
        self.write().replace_region(region)
    }

    /// Stage a region removal (write lock).
    pub fn remove_region(&self, name: &str) -> bool {
        self.write().remove_region(name)
    }

    /// Commit staged operations (write lock).
    pub fn save(&self) -> Result<()> {
        self.write().save()
    }

    /// Discard staged operations and reload (write lock).
    pub fn restore(&self) -> Result<()> {
        self.write().restore()
    }

    /// Run `f` against the engine metrics (read lock).
    pub fn with_metrics<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&EngineMetrics) -> R,
    {
        let engine = self.read();
        f(engine.metrics())
    }
}
