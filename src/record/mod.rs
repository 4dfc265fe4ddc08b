//! Record Module
//!
//! The binary layout of a single key/value pair.
//!
//! ## Record Format
//! ```text
//! ┌──────────────┬───────────┬────────────────┬─────────────┐
//! │ KeyLen (4)   │ Key       │ ValLen (4)     │ Value       │
//! │ i32 LE       │ KeyLen B  │ i32 LE         │ ValLen B    │
//! └──────────────┴───────────┴────────────────┴─────────────┘
//! ```
//!
//! ## Absent values
//! An absent value (`None`) and an empty value (`Some(vec![])`) both encode
//! as `ValLen = 0` and both decode as `None`. The round trip is lossy for
//! empty values; callers that need the distinction must not rely on the file.

mod codec;

pub use codec::{decode, encode, encode_into, encoded_len, frame_len, Frame};

/// Size of each length field in bytes
pub const LEN_FIELD_SIZE: usize = 4;

/// Record key
pub type Key = Vec<u8>;

/// Record value; `None` is the absent marker
pub type Value = Option<Vec<u8>>;
