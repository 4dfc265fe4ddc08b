//! Store Module
//!
//! The in-memory map and its snapshot file.
//!
//! ## Responsibilities
//! - Serve reads and writes against the in-memory map
//! - Track whether the map has unsaved mutations
//! - Replace the map from a snapshot file (load)
//! - Write the map to a snapshot file (save / save_as)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{FlatError, Result};
use crate::file::{FileSystem, LocalFileSystem};
use crate::record::{Key, Value};
use crate::stream;

/// In-memory key-value store with snapshot persistence
///
/// ## Concurrency Model: Single Coarse Lock
///
/// - Every operation, including `load` and `save`, holds `state` for its
///   whole duration. Callers block while a snapshot is read or written.
/// - The lock is not reentrant. The visitor passed to `iterate` must not
///   call back into the store; doing so deadlocks.
///
/// ## Absent values
/// `add(key, None)` stores a key with no value. On disk an absent value and
/// an empty value are the same, so both come back as `None` after a load.
pub struct Store {
    /// Store configuration
    config: Config,

    /// Opens and creates snapshot files
    fs: Box<dyn FileSystem>,

    /// Entries, dirty flag and snapshot path
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<Key, Value>,
    /// Set by every mutation, cleared by a successful save
    dirty: bool,
    /// File recorded by the last successful load or save_as
    path: Option<PathBuf>,
}

impl Store {
    /// Create an empty store with the default config on the local disk
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            fs: Box::new(LocalFileSystem),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Create an empty store with the given config on the local disk
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_file_system(config, LocalFileSystem)
    }

    /// Create an empty store backed by a custom file system
    pub fn with_file_system(config: Config, fs: impl FileSystem + 'static) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fs: Box::new(fs),
            state: Mutex::new(StoreState::default()),
        })
    }

    // =========================================================================
    // Map Operations
    // =========================================================================

    /// Insert or overwrite a key
    ///
    /// Marks the store dirty even when the value is unchanged.
    pub fn add(&self, key: impl Into<Key>, value: Value) {
        let mut state = self.state.lock();
        state.entries.insert(key.into(), value);
        state.dirty = true;
    }

    /// Look up a key
    ///
    /// Returns:
    /// - `None` — key not present
    /// - `Some(None)` — key present with an absent value
    /// - `Some(Some(value))` — key present with a value
    pub fn get(&self, key: &[u8]) -> Option<Value> {
        self.state.lock().entries.get(key).cloned()
    }

    /// Check whether a key is present
    pub fn exists(&self, key: &[u8]) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    /// Remove a key, returning whether it was present
    ///
    /// Only marks the store dirty when an entry was removed.
    pub fn delete(&self, key: &[u8]) -> bool {
        let mut state = self.state.lock();
        let removed = state.entries.remove(key).is_some();
        if removed {
            state.dirty = true;
        }
        removed
    }

    /// Number of entries
    pub fn count(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Visit every entry in unspecified order while holding the lock
    ///
    /// Iteration stops as soon as `visitor` returns `false`. The visitor must
    /// not call any method on this store.
    pub fn iterate<F>(&self, mut visitor: F)
    where
        F: FnMut(&[u8], Option<&[u8]>) -> bool,
    {
        let state = self.state.lock();
        for (key, value) in state.entries.iter() {
            if !visitor(key, value.as_deref()) {
                break;
            }
        }
    }

    // =========================================================================
    // Snapshot Operations
    // =========================================================================

    /// Replace the contents of the store with the records in `path`
    ///
    /// Records are decoded into a temporary map that is swapped in only
    /// after the whole file has been read. When a key appears more than
    /// once the last record wins. On failure the store is unchanged.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut state = self.state.lock();
        let started = Instant::now();

        let entries = self.read_snapshot(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Load failed");
            e
        })?;

        debug!(
            path = %path.display(),
            entries = entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Loaded snapshot"
        );

        state.entries = entries;
        state.dirty = self.config.mark_dirty_on_load;
        state.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Save to the path recorded by the last `load` or `save_as`
    pub fn save(&self) -> Result<()> {
        let mut state = self.state.lock();
        let path = state.path.clone().ok_or(FlatError::NoPathConfigured)?;
        self.save_locked(&mut state, &path)
    }

    /// Save to `path` and remember it for later `save` calls
    ///
    /// Does nothing when the store has no unsaved mutations. On failure the
    /// dirty flag and recorded path are unchanged, but `path` may already
    /// have been truncated.
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut state = self.state.lock();
        self.save_locked(&mut state, path.as_ref())
    }

    fn save_locked(&self, state: &mut StoreState, path: &Path) -> Result<()> {
        if !state.dirty {
            debug!(path = %path.display(), "No changes, skipping save");
            return Ok(());
        }

        let started = Instant::now();
        let summary = self.write_snapshot(&state.entries, path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Save failed");
            e
        })?;

        debug!(
            path = %path.display(),
            records = summary.records,
            bytes = summary.bytes,
            batches = summary.batches,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Saved snapshot"
        );

        state.dirty = false;
        state.path = Some(path.to_path_buf());
        Ok(())
    }

    fn read_snapshot(&self, path: &Path) -> Result<HashMap<Key, Value>> {
        let handle = self.fs.open(path)?;
        let reader = stream::read_all(handle, &self.config)?;

        let mut entries = HashMap::new();
        for pair in reader {
            let (key, value) = pair?;
            entries.insert(key, value);
        }
        Ok(entries)
    }

    fn write_snapshot(
        &self,
        entries: &HashMap<Key, Value>,
        path: &Path,
    ) -> Result<stream::WriteSummary> {
        let handle = self.fs.create(path)?;

        if self.config.ordered_save {
            let mut sorted: Vec<_> = entries.iter().collect();
            sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));
            stream::write_all(handle, sorted.into_iter().map(|(k, v)| (k, v.as_ref())), &self.config)
        } else {
            stream::write_all(handle, entries.iter().map(|(k, v)| (k, v.as_ref())), &self.config)
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Whether the store has mutations not yet saved
    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    /// The snapshot path recorded by the last `load` or `save_as`
    pub fn path(&self) -> Option<PathBuf> {
        self.state.lock().path.clone()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
