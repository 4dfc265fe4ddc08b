//! # flatkv
//!
//! An in-memory key-value store that snapshots to a single flat file:
//! - Byte-string keys and values, with an "absent" value marker
//! - Length-prefixed binary records with explicit little-endian lengths
//! - Batched streaming load/save that never holds the whole file in memory
//! - One coarse lock per store, held across file I/O
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │        HashMap<Key, Value> + dirty flag + path (Mutex)      │
//! └──────────────┬───────────────────────────────▲──────────────┘
//!          save  │                               │  load
//!                ▼                               │
//! ┌──────────────────────────┐    ┌──────────────┴─────────────┐
//! │      RecordWriter        │    │       RecordReader         │
//! │  (batch → flush)         │    │  (cursor + refill)         │
//! └──────────────┬───────────┘    └──────────────▲─────────────┘
//!                │        Record codec           │
//!                ▼                               │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  FileSystem / FileHandle                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod file;
pub mod record;
pub mod stream;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FlatError, Result};
pub use config::{Config, FileFormat};
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of flatkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
