//! Record Reader
//!
//! Streams records out of a file handle through a bounded buffer.

use std::io::ErrorKind;

use tracing::trace;

use crate::config::{Config, FileFormat};
use crate::error::{FlatError, Result};
use crate::file::FileHandle;
use crate::record::{self, Frame, Key, Value};

use super::container::{self, Footer, FOOTER_SIZE, HEADER_SIZE};

/// Lazy, non-restartable iterator over the records of one file
///
/// ## Buffer invariant
/// `buf[cursor..filled]` holds bytes read from the handle but not yet
/// decoded. Before decoding, the reader measures the next record; if it is
/// incomplete the leftover bytes are moved to the front and more are read,
/// growing the buffer when a single record is larger than it.
///
/// ## End of input
/// A legacy file ends only when the handle returns `Ok(0)`. The size the
/// handle reported at open is a hint that bounds buffer growth, so an absurd
/// declared length costs at most a doubling before end of input exposes it.
/// The versioned container is framed by that size: records stop at
/// `size - footer`, and bytes after the footer are `Corrupted`.
pub struct RecordReader<H: FileHandle> {
    handle: H,
    buf: Vec<u8>,
    /// Start of the next undecoded record in `buf`
    cursor: usize,
    /// Number of valid bytes in `buf`
    filled: usize,
    /// File offset of `buf[0]`
    buf_offset: u64,
    /// Record bytes the reported size says are still unread
    remaining: u64,
    /// The handle has no more record bytes to give
    eof: bool,
    format: FileFormat,
    /// Running CRC of record bytes (versioned container only)
    checksum: Option<crc32fast::Hasher>,
    records_read: u64,
    bytes_read: u64,
    done: bool,
}

impl<H: FileHandle> RecordReader<H> {
    /// Prepare to read records from the start of `handle`
    ///
    /// For the versioned container this reads and validates the header.
    pub fn new(mut handle: H, config: &Config) -> Result<Self> {
        config.validate()?;
        let size = handle.size()?;

        let (data_start, remaining, checksum) = match config.format {
            FileFormat::Legacy => (0, size, None),
            FileFormat::Versioned => {
                let framing = (HEADER_SIZE + FOOTER_SIZE) as u64;
                if size < framing {
                    return Err(FlatError::Corrupted(format!(
                        "file too small for versioned container: {} bytes",
                        size
                    )));
                }

                let mut header = [0u8; HEADER_SIZE];
                read_exact(&mut handle, &mut header)?;
                container::check_header(&header)?;

                (HEADER_SIZE as u64, size - framing, Some(crc32fast::Hasher::new()))
            }
        };

        Ok(Self {
            handle,
            buf: vec![0u8; config.read_buffer_size],
            cursor: 0,
            filled: 0,
            buf_offset: data_start,
            remaining,
            eof: false,
            format: config.format,
            checksum,
            records_read: 0,
            bytes_read: 0,
            done: false,
        })
    }

    /// Number of records decoded so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Number of record bytes decoded so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Decode the next record, refilling as many times as it takes
    fn next_record(&mut self) -> Result<Option<(Key, Value)>> {
        loop {
            let frame = record::frame_len(&self.buf[self.cursor..self.filled])?;
            let available = self.filled - self.cursor;

            match frame {
                Frame::Complete(len) => {
                    let (key, value, consumed) =
                        record::decode(&self.buf[..self.filled], self.cursor)?;
                    debug_assert_eq!(len, consumed);

                    if let Some(hasher) = self.checksum.as_mut() {
                        hasher.update(&self.buf[self.cursor..self.cursor + consumed]);
                    }
                    self.cursor += consumed;
                    self.records_read += 1;
                    self.bytes_read += consumed as u64;

                    return Ok(Some((key, value)));
                }
                Frame::Incomplete { needed } => {
                    if self.format == FileFormat::Versioned && self.remaining == 0 {
                        self.eof = true;
                    }
                    if self.eof {
                        if available == 0 {
                            self.finish()?;
                            return Ok(None);
                        }
                        return Err(self.truncated(needed, available));
                    }

                    // The container's record section cannot outgrow its frame
                    if self.format == FileFormat::Versioned
                        && (needed - available) as u64 > self.remaining
                    {
                        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
                        return Err(self.truncated(needed, available.saturating_add(remaining)));
                    }

                    self.refill(needed)?;
                }
            }
        }
    }

    fn truncated(&self, needed: usize, available: usize) -> FlatError {
        FlatError::TruncatedRecord {
            offset: self.buf_offset + self.cursor as u64,
            needed,
            available,
        }
    }

    /// Compact leftover bytes to the front, grow toward `needed`, then do one
    /// read. Sets `eof` when the handle has nothing more to give.
    fn refill(&mut self, needed: usize) -> Result<()> {
        if self.cursor > 0 {
            self.buf.copy_within(self.cursor..self.filled, 0);
            self.filled -= self.cursor;
            self.buf_offset += self.cursor as u64;
            self.cursor = 0;
        }

        if self.buf.len() < needed {
            // Trust the reported size, but keep doubling while the handle
            // keeps producing bytes past it
            let hinted = usize::try_from(self.remaining)
                .unwrap_or(usize::MAX)
                .saturating_add(self.filled);
            let target = needed.min(hinted.max(self.buf.len().saturating_mul(2)));
            trace!(from = self.buf.len(), to = target, needed, "Growing read buffer");
            self.buf.resize(target, 0);
        }

        let end = match self.format {
            FileFormat::Legacy => self.buf.len(),
            FileFormat::Versioned => {
                let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
                self.buf.len().min(self.filled.saturating_add(remaining))
            }
        };

        loop {
            match self.handle.read(&mut self.buf[self.filled..end]) {
                Ok(0) => {
                    trace!(remaining = self.remaining, "End of input");
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    trace!(bytes = n, offset = self.buf_offset + self.filled as u64, "Refilled read buffer");
                    self.filled += n;
                    self.remaining = self.remaining.saturating_sub(n as u64);
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Validate the footer once every record has been decoded
    fn finish(&mut self) -> Result<()> {
        if self.format == FileFormat::Legacy {
            return Ok(());
        }

        let mut bytes = [0u8; FOOTER_SIZE];
        read_exact(&mut self.handle, &mut bytes)?;
        let footer = Footer::decode(&bytes);

        if footer.record_count != self.records_read {
            return Err(FlatError::Corrupted(format!(
                "record count mismatch: footer says {}, read {}",
                footer.record_count, self.records_read
            )));
        }

        if let Some(hasher) = self.checksum.take() {
            let actual = hasher.finalize();
            if actual != footer.crc {
                return Err(FlatError::ChecksumMismatch {
                    expected: footer.crc,
                    actual,
                });
            }
        }

        if !at_end(&mut self.handle)? {
            return Err(FlatError::Corrupted(
                "data after versioned footer".to_string(),
            ));
        }

        Ok(())
    }
}

impl<H: FileHandle> Iterator for RecordReader<H> {
    type Item = Result<(Key, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_record() {
            Ok(Some(pair)) => Some(Ok(pair)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<H: FileHandle> std::iter::FusedIterator for RecordReader<H> {}

/// Fill `buf` completely from `handle`
fn read_exact<H: FileHandle>(handle: &mut H, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match handle.read(&mut buf[filled..]) {
            Ok(0) => return Err(std::io::Error::from(ErrorKind::UnexpectedEof).into()),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Whether `handle` has no bytes left
fn at_end<H: FileHandle>(handle: &mut H) -> Result<bool> {
    let mut byte = [0u8; 1];
    loop {
        match handle.read(&mut byte) {
            Ok(n) => return Ok(n == 0),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
