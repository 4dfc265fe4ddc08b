//! Stream Module
//!
//! Moves records between memory and a file handle in bounded batches.
//!
//! ## Responsibilities
//! - Read records through a fixed buffer, refilling by bytes needed
//! - Never drop or misread a record that straddles a refill boundary
//! - Accumulate encoded records and flush them in batches
//! - Frame the optional versioned container
//!
//! ## Versioned Container
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Header (6 bytes)                            │
//! │   Magic: "FLKV" (4) | Version: u16 (2)      │
//! ├─────────────────────────────────────────────┤
//! │ Records (same layout as the legacy file)    │
//! ├─────────────────────────────────────────────┤
//! │ Footer (12 bytes)                           │
//! │   RecordCount: u64 (8) | CRC32: u32 (4)     │
//! └─────────────────────────────────────────────┘
//! ```
//! The legacy layout is the record section alone.

mod container;
mod reader;
mod writer;

pub use container::{FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};
pub use reader::RecordReader;
pub use writer::{RecordWriter, WriteSummary};

use crate::config::Config;
use crate::error::Result;
use crate::file::FileHandle;

/// Lazily decode every record in `handle`
///
/// The returned iterator yields `Err` at most once, then stops.
pub fn read_all<H: FileHandle>(handle: H, config: &Config) -> Result<RecordReader<H>> {
    RecordReader::new(handle, config)
}

/// Encode `pairs` into `handle` in batches, in iterator order
pub fn write_all<H, I, K, V>(handle: H, pairs: I, config: &Config) -> Result<WriteSummary>
where
    H: FileHandle,
    I: IntoIterator<Item = (K, Option<V>)>,
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let mut writer = RecordWriter::new(handle, config)?;
    for (key, value) in pairs {
        writer.push(key.as_ref(), value.as_ref().map(|v| v.as_ref()))?;
    }
    writer.finish()
}
