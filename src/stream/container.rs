//! Versioned container framing

use bytes::BufMut;

use crate::error::{FlatError, Result};

/// Magic bytes identifying a versioned flatkv file
pub const MAGIC: &[u8; 4] = b"FLKV";

/// Current container version
pub const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) = 6 bytes
pub const HEADER_SIZE: usize = 6;

/// Footer size: RecordCount (8) + CRC32 (4) = 12 bytes
pub const FOOTER_SIZE: usize = 12;

pub(super) fn encode_header<B: BufMut>(buf: &mut B) {
    buf.put_slice(MAGIC);
    buf.put_u16_le(VERSION);
}

pub(super) fn check_header(header: &[u8; HEADER_SIZE]) -> Result<()> {
    if &header[0..4] != MAGIC {
        return Err(FlatError::Corrupted(format!(
            "invalid magic: expected FLKV, got {:?}",
            &header[0..4]
        )));
    }

    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != VERSION {
        return Err(FlatError::Corrupted(format!(
            "unsupported container version: {}",
            version
        )));
    }

    Ok(())
}

/// Trailer written after the last record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Footer {
    pub record_count: u64,
    pub crc: u32,
}

impl Footer {
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u64_le(self.record_count);
        buf.put_u32_le(self.crc);
    }

    pub fn decode(bytes: &[u8; FOOTER_SIZE]) -> Self {
        let mut count = [0u8; 8];
        count.copy_from_slice(&bytes[0..8]);
        Self {
            record_count: u64::from_le_bytes(count),
            crc: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        }
    }
}
