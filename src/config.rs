//! Configuration for flatkv
//!
//! Centralized configuration with sensible defaults.

use crate::error::{FlatError, Result};

/// Main configuration for a flatkv store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Stream Configuration
    // -------------------------------------------------------------------------
    /// Write batch threshold: encoded records accumulate until the buffer
    /// reaches this many bytes, then the batch is flushed to the file
    pub write_batch_size: usize,

    /// Initial read buffer size. The buffer only grows past this when a
    /// single record does not fit.
    pub read_buffer_size: usize,

    /// On-disk layout used by both load and save
    pub format: FileFormat,

    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Write records sorted by key, so saving identical contents produces
    /// identical bytes. When false, records follow map iteration order.
    pub ordered_save: bool,

    /// Leave the store dirty after a successful load, so the next save
    /// rewrites the file even without mutations
    pub mark_dirty_on_load: bool,

    /// fsync the file at the end of every save
    pub sync_on_save: bool,
}

/// Layout of a snapshot file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// Bare records back to back: no header, no version, no checksum
    #[default]
    Legacy,

    /// Magic + version header, bare records, record count + CRC32 footer
    Versioned,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            write_batch_size: 1024 * 1024, // 1 MB
            read_buffer_size: 1024 * 1024, // 1 MB
            format: FileFormat::Legacy,
            ordered_save: true,
            mark_dirty_on_load: false,
            sync_on_save: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that buffer sizes are usable
    pub fn validate(&self) -> Result<()> {
        if self.write_batch_size == 0 {
            return Err(FlatError::Config(
                "write_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.read_buffer_size == 0 {
            return Err(FlatError::Config(
                "read_buffer_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the write batch threshold (in bytes)
    pub fn write_batch_size(mut self, size: usize) -> Self {
        self.config.write_batch_size = size;
        self
    }

    /// Set the initial read buffer size (in bytes)
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Set the file format
    pub fn format(mut self, format: FileFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Sort records by key on save
    pub fn ordered_save(mut self, ordered: bool) -> Self {
        self.config.ordered_save = ordered;
        self
    }

    /// Keep the dirty flag set after a successful load
    pub fn mark_dirty_on_load(mut self, dirty: bool) -> Self {
        self.config.mark_dirty_on_load = dirty;
        self
    }

    /// fsync at the end of every save
    pub fn sync_on_save(mut self, sync: bool) -> Self {
        self.config.sync_on_save = sync;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
