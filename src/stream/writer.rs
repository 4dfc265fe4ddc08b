//! Record Writer
//!
//! Accumulates encoded records and flushes them to a file handle in batches.

use bytes::BytesMut;
use tracing::trace;

use crate::config::{Config, FileFormat};
use crate::error::Result;
use crate::file::FileHandle;
use crate::record;

use super::container::{self, Footer};

/// Totals reported once a write completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Records written
    pub records: u64,
    /// Bytes written to the handle, framing included
    pub bytes: u64,
    /// Number of write calls issued to the handle
    pub batches: u64,
}

/// Batched writer for one output file
///
/// Call `push()` for each record in the desired order, then `finish()`.
/// Dropping the writer without `finish()` discards the unflushed batch.
pub struct RecordWriter<H: FileHandle> {
    handle: H,
    buf: BytesMut,
    batch_size: usize,
    sync: bool,
    /// Running CRC of record bytes (versioned container only)
    checksum: Option<crc32fast::Hasher>,
    summary: WriteSummary,
}

impl<H: FileHandle> RecordWriter<H> {
    /// Create a writer; the versioned header is buffered immediately
    pub fn new(handle: H, config: &Config) -> Result<Self> {
        config.validate()?;

        let mut buf = BytesMut::with_capacity(config.write_batch_size);
        let checksum = match config.format {
            FileFormat::Legacy => None,
            FileFormat::Versioned => {
                container::encode_header(&mut buf);
                Some(crc32fast::Hasher::new())
            }
        };

        Ok(Self {
            handle,
            buf,
            batch_size: config.write_batch_size,
            sync: config.sync_on_save,
            checksum,
            summary: WriteSummary::default(),
        })
    }

    /// Encode one record, flushing the batch once it reaches the threshold
    pub fn push(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        let start = self.buf.len();
        record::encode_into(&mut self.buf, key, value)?;

        if let Some(hasher) = self.checksum.as_mut() {
            hasher.update(&self.buf[start..]);
        }
        self.summary.records += 1;

        if self.buf.len() >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    /// Flush the remainder (plus footer) and optionally sync
    pub fn finish(mut self) -> Result<WriteSummary> {
        if let Some(hasher) = self.checksum.take() {
            let footer = Footer {
                record_count: self.summary.records,
                crc: hasher.finalize(),
            };
            footer.encode(&mut self.buf);
        }

        self.flush_batch()?;

        if self.sync {
            self.handle.sync()?;
        }

        Ok(self.summary)
    }

    fn flush_batch(&mut self) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }

        self.handle.write_all(&self.buf)?;
        trace!(bytes = self.buf.len(), batch = self.summary.batches, "Flushed write batch");

        self.summary.bytes += self.buf.len() as u64;
        self.summary.batches += 1;
        self.buf.clear();
        Ok(())
    }
}
