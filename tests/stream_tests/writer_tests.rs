//! Tests for the batched record writer
//!
//! These tests verify:
//! - Output bytes follow iterator order with the legacy layout
//! - Batches are flushed when the threshold is reached
//! - Remainder is flushed on finish
//! - Sync behavior follows the config
//! - Write errors propagate
//! - Versioned header and footer contents

use std::io::{self, Cursor, ErrorKind};

use flatkv::config::{Config, FileFormat};
use flatkv::file::FileHandle;
use flatkv::record;
use flatkv::stream::{self, RecordWriter, WriteSummary, FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};
use flatkv::FlatError;

// =============================================================================
// Helper Functions
// =============================================================================

/// Handle that records every write call
#[derive(Default)]
struct RecordingHandle {
    data: Vec<u8>,
    writes: Vec<usize>,
    syncs: usize,
    /// Fail the write call with this index
    fail_on_write: Option<usize>,
}

impl FileHandle for RecordingHandle {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.fail_on_write == Some(self.writes.len()) {
            return Err(io::Error::new(ErrorKind::Other, "no space left"));
        }
        self.writes.push(buf.len());
        self.data.extend_from_slice(buf);
        Ok(())
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.syncs += 1;
        Ok(())
    }
}

/// Ten records of exactly 20 bytes each
fn fixed_pairs() -> Vec<(Vec<u8>, Option<Vec<u8>>)> {
    (0..10)
        .map(|i| (format!("k{:03}", i).into_bytes(), Some(b"vvvvvvvv".to_vec())))
        .collect()
}

fn batch_config(batch: usize) -> Config {
    Config::builder().write_batch_size(batch).build()
}

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_write_empty_legacy() {
    let mut handle = RecordingHandle::default();

    let summary =
        stream::write_all(&mut handle, Vec::<(Vec<u8>, Option<Vec<u8>>)>::new(), &Config::default())
            .unwrap();

    assert_eq!(summary, WriteSummary { records: 0, bytes: 0, batches: 0 });
    assert!(handle.data.is_empty());
    assert!(handle.writes.is_empty());
}

#[test]
fn test_write_matches_concatenated_records() {
    let pairs = vec![
        (b"zeta".to_vec(), Some(b"last-letter".to_vec())),
        (b"alpha".to_vec(), None),
        (b"mid".to_vec(), Some(Vec::new())),
    ];
    let mut cursor = Cursor::new(Vec::new());

    stream::write_all(&mut cursor, pairs.clone(), &Config::default()).unwrap();

    let mut expected = Vec::new();
    for (key, value) in &pairs {
        expected.extend(record::encode(key, value.as_deref()).unwrap());
    }
    assert_eq!(cursor.into_inner(), expected);
}

#[test]
fn test_write_with_borrowed_pairs() {
    let key = b"borrowed".to_vec();
    let value = b"value".to_vec();
    let mut cursor = Cursor::new(Vec::new());

    let summary =
        stream::write_all(&mut cursor, [(&key[..], Some(&value[..]))], &Config::default()).unwrap();

    assert_eq!(summary.records, 1);
    assert_eq!(summary.bytes, 4 + 8 + 4 + 5);
}

// =============================================================================
// Batching Tests
// =============================================================================

#[test]
fn test_batches_flush_at_threshold() {
    let mut handle = RecordingHandle::default();

    let summary = stream::write_all(&mut handle, fixed_pairs(), &batch_config(64)).unwrap();

    // Flush once the buffer holds >= 64 bytes: after 4 records, after 8, then the tail
    assert_eq!(handle.writes, vec![80, 80, 40]);
    assert_eq!(summary, WriteSummary { records: 10, bytes: 200, batches: 3 });
}

#[test]
fn test_single_batch_when_threshold_not_reached() {
    let mut handle = RecordingHandle::default();

    stream::write_all(&mut handle, fixed_pairs(), &batch_config(1024 * 1024)).unwrap();

    assert_eq!(handle.writes, vec![200]);
}

#[test]
fn test_batch_size_one_flushes_every_record() {
    let mut handle = RecordingHandle::default();

    let summary = stream::write_all(&mut handle, fixed_pairs(), &batch_config(1)).unwrap();

    assert_eq!(handle.writes, vec![20; 10]);
    assert_eq!(summary.batches, 10);
}

#[test]
fn test_batched_output_equals_unbatched_output() {
    let mut small = RecordingHandle::default();
    let mut large = RecordingHandle::default();

    stream::write_all(&mut small, fixed_pairs(), &batch_config(7)).unwrap();
    stream::write_all(&mut large, fixed_pairs(), &batch_config(1 << 20)).unwrap();

    assert_eq!(small.data, large.data);
}

#[test]
fn test_push_then_finish() {
    let mut handle = RecordingHandle::default();
    let mut writer = RecordWriter::new(&mut handle, &batch_config(64)).unwrap();

    writer.push(b"a", Some(b"1")).unwrap();
    writer.push(b"b", None).unwrap();
    let summary = writer.finish().unwrap();

    assert_eq!(summary.records, 2);
    assert_eq!(handle.data.len(), 10 + 9);
}

// =============================================================================
// Sync and Error Tests
// =============================================================================

#[test]
fn test_sync_on_finish() {
    let mut handle = RecordingHandle::default();
    stream::write_all(&mut handle, fixed_pairs(), &Config::default()).unwrap();
    assert_eq!(handle.syncs, 1);

    let mut handle = RecordingHandle::default();
    let config = Config::builder().sync_on_save(false).build();
    stream::write_all(&mut handle, fixed_pairs(), &config).unwrap();
    assert_eq!(handle.syncs, 0);
}

#[test]
fn test_write_error_propagates() {
    let mut handle = RecordingHandle {
        fail_on_write: Some(1),
        ..Default::default()
    };

    let result = stream::write_all(&mut handle, fixed_pairs(), &batch_config(64));

    assert!(matches!(result, Err(FlatError::Io(ref e)) if e.kind() == ErrorKind::Other));
    assert_eq!(handle.writes, vec![80]);
    assert_eq!(handle.syncs, 0);
}

#[test]
fn test_zero_batch_size_rejected() {
    let result = RecordWriter::new(RecordingHandle::default(), &batch_config(0));

    assert!(matches!(result, Err(FlatError::Config(_))));
}

// =============================================================================
// Versioned Container Tests
// =============================================================================

#[test]
fn test_versioned_layout() {
    let config = Config::builder()
        .format(FileFormat::Versioned)
        .write_batch_size(64)
        .build();
    let mut handle = RecordingHandle::default();

    let summary = stream::write_all(&mut handle, fixed_pairs(), &config).unwrap();

    let data = &handle.data;
    assert_eq!(data.len(), HEADER_SIZE + 200 + FOOTER_SIZE);
    assert_eq!(summary.bytes, data.len() as u64);
    assert_eq!(&data[0..4], MAGIC);
    assert_eq!(&data[4..6], &VERSION.to_le_bytes());

    let records = &data[HEADER_SIZE..HEADER_SIZE + 200];
    let footer = &data[HEADER_SIZE + 200..];
    assert_eq!(&footer[0..8], &10u64.to_le_bytes());
    assert_eq!(&footer[8..12], &crc32fast::hash(records).to_le_bytes());
}

#[test]
fn test_versioned_records_match_legacy_records() {
    let versioned = Config::builder().format(FileFormat::Versioned).build();
    let mut legacy_out = Cursor::new(Vec::new());
    let mut versioned_out = Cursor::new(Vec::new());

    stream::write_all(&mut legacy_out, fixed_pairs(), &Config::default()).unwrap();
    stream::write_all(&mut versioned_out, fixed_pairs(), &versioned).unwrap();

    let legacy = legacy_out.into_inner();
    let versioned = versioned_out.into_inner();
    assert_eq!(&versioned[HEADER_SIZE..versioned.len() - FOOTER_SIZE], &legacy[..]);
}
