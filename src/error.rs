//! Error types for flatkv
//!
//! Provides a unified error type for all operations.

use std::fmt;

use thiserror::Error;

/// Result type alias using FlatError
pub type Result<T> = std::result::Result<T, FlatError>;

/// Which length field of a record an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthField {
    Key,
    Value,
}

impl fmt::Display for LengthField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthField::Key => f.write_str("key"),
            LengthField::Value => f.write_str("value"),
        }
    }
}

/// Unified error type for flatkv operations
#[derive(Debug, Error)]
pub enum FlatError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    /// A record needs more bytes than the input holds.
    /// `offset` is where the record starts (file offset when reading a
    /// stream, buffer offset when decoding a slice).
    #[error("Truncated record at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedRecord {
        offset: u64,
        needed: usize,
        available: usize,
    },

    #[error("Invalid {field} length: {length}")]
    InvalidLength { field: LengthField, length: i32 },

    #[error("Key too large: {len} bytes (max {max})", max = i32::MAX)]
    KeyTooLarge { len: usize },

    #[error("Value too large: {len} bytes (max {max})", max = i32::MAX)]
    ValueTooLarge { len: usize },

    // -------------------------------------------------------------------------
    // Container Errors
    // -------------------------------------------------------------------------
    #[error("Corrupted file: {0}")]
    Corrupted(String),

    #[error("Checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("No path configured: load or save_as a file first")]
    NoPathConfigured,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
