//! Record codec
//!
//! Encoding and decoding functions for a single record.

use bytes::BufMut;

use crate::error::{FlatError, LengthField, Result};

use super::{Key, Value, LEN_FIELD_SIZE};

/// How much of a record is present at the front of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// The whole record is present and spans this many bytes
    Complete(usize),

    /// The buffer must hold at least `needed` bytes before the record
    /// can be measured further or decoded
    Incomplete { needed: usize },
}

// =============================================================================
// Encoding
// =============================================================================

/// Exact encoded size of a record
pub fn encoded_len(key: &[u8], value: Option<&[u8]>) -> usize {
    LEN_FIELD_SIZE + key.len() + LEN_FIELD_SIZE + value.map_or(0, <[u8]>::len)
}

/// Append one record to `buf`, returning the number of bytes appended
pub fn encode_into<B: BufMut>(buf: &mut B, key: &[u8], value: Option<&[u8]>) -> Result<usize> {
    let value = value.unwrap_or_default();
    let key_len = checked_len(key.len(), LengthField::Key)?;
    let val_len = checked_len(value.len(), LengthField::Value)?;

    buf.put_i32_le(key_len);
    buf.put_slice(key);
    buf.put_i32_le(val_len);
    buf.put_slice(value);

    Ok(LEN_FIELD_SIZE + key.len() + LEN_FIELD_SIZE + value.len())
}

/// Encode one record into a fresh buffer
pub fn encode(key: &[u8], value: Option<&[u8]>) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(encoded_len(key, value));
    encode_into(&mut buf, key, value)?;
    Ok(buf)
}

fn checked_len(len: usize, field: LengthField) -> Result<i32> {
    i32::try_from(len).map_err(|_| match field {
        LengthField::Key => FlatError::KeyTooLarge { len },
        LengthField::Value => FlatError::ValueTooLarge { len },
    })
}

// =============================================================================
// Decoding
// =============================================================================

/// Measure the record at the front of `input` without copying payloads
pub fn frame_len(input: &[u8]) -> Result<Frame> {
    let key_len = match read_len(input, 0, LengthField::Key)? {
        Some(len) => len,
        None => return Ok(Frame::Incomplete { needed: LEN_FIELD_SIZE }),
    };

    let val_at = LEN_FIELD_SIZE.saturating_add(key_len);
    let val_len = match read_len(input, val_at, LengthField::Value)? {
        Some(len) => len,
        None => {
            return Ok(Frame::Incomplete {
                needed: val_at.saturating_add(LEN_FIELD_SIZE),
            })
        }
    };

    let total = val_at
        .saturating_add(LEN_FIELD_SIZE)
        .saturating_add(val_len);
    if input.len() < total {
        Ok(Frame::Incomplete { needed: total })
    } else {
        Ok(Frame::Complete(total))
    }
}

/// Decode the record starting at `offset`
///
/// Returns the key, the value and the number of bytes consumed.
pub fn decode(buf: &[u8], offset: usize) -> Result<(Key, Value, usize)> {
    let input = buf.get(offset..).unwrap_or_default();

    let total = match frame_len(input)? {
        Frame::Complete(total) => total,
        Frame::Incomplete { needed } => {
            return Err(FlatError::TruncatedRecord {
                offset: offset as u64,
                needed,
                available: input.len(),
            })
        }
    };

    // frame_len has validated both length fields
    let key_len = i32::from_le_bytes([input[0], input[1], input[2], input[3]]) as usize;
    let key_end = LEN_FIELD_SIZE + key_len;
    let key = input[LEN_FIELD_SIZE..key_end].to_vec();

    let val_start = key_end + LEN_FIELD_SIZE;
    let value = if val_start == total {
        None
    } else {
        Some(input[val_start..total].to_vec())
    };

    Ok((key, value, total))
}

/// Read a length field at `at`; `None` when the field itself is not present
fn read_len(input: &[u8], at: usize, field: LengthField) -> Result<Option<usize>> {
    let bytes = match input.get(at..at.saturating_add(LEN_FIELD_SIZE)) {
        Some(b) if b.len() == LEN_FIELD_SIZE => [b[0], b[1], b[2], b[3]],
        _ => return Ok(None),
    };

    let length = i32::from_le_bytes(bytes);
    if length < 0 {
        return Err(FlatError::InvalidLength { field, length });
    }
    Ok(Some(length as usize))
}
