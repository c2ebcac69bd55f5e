//! # cborium
//!
//! A CBOR (Concise Binary Object Representation) encoder/decoder built around a
//! generic [`Value`] tree rather than a fixed schema.
//!
//! ## Features
//! - Full support for CBOR major types 0-7
//! - Indefinite-length byte strings, text strings, arrays and maps
//!   (break-terminated streaming encodings decode to the same `Value` shapes
//!   as their definite-length equivalents)
//! - Arbitrary-precision integers via the bignum tags (2/3), backed by
//!   `num-bigint`
//! - Half/single/double precision floats on decode (always widened to `f64`)
//! - Pluggable input sources through the [`Reader`] trait: an in-memory
//!   slice, any `std::io::Read` stream, or a chunked source that may return
//!   short reads
//! - A tag-mapping layer ([`tags::TagMapper`]) for translating recognized
//!   tags into application values and back
//!
//! Maps preserve encounter order and permit duplicate keys, matching what the
//! wire format allows; nothing is deduplicated during decode.
//!
//! ## Example
//! ```
//! use cborium::{decode, encode, Value};
//!
//! let value = Value::Array(vec![
//!     Value::UInt(1),
//!     Value::Text("two".to_string()),
//!     Value::Float(3.0),
//! ]);
//!
//! let bytes = encode(&value).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), value);
//! ```
//!
//! Decoding straight from a file or socket goes through a reader backend:
//! ```no_run
//! use cborium::{decode_from, StreamReader};
//!
//! let file = std::fs::File::open("payload.cbor").unwrap();
//! let value = decode_from(StreamReader::new(std::io::BufReader::new(file))).unwrap();
//! ```

use thiserror::Error;

pub mod bignum;
pub mod decode;
pub mod encode;
pub mod reader;
pub mod tags;
pub mod value;

pub use decode::{DEFAULT_MAX_DEPTH, Decoder};
pub use encode::{encode, encode_to, encoded_len};
pub use num_bigint::BigInt;
pub use reader::{ChunkReader, ChunkSource, Reader, SliceReader, StreamReader};
pub use tags::{TagHandler, TagMapper};
pub use value::Value;

// CBOR major types
pub(crate) const MAJOR_UNSIGNED: u8 = 0;
pub(crate) const MAJOR_NEGATIVE: u8 = 1;
pub(crate) const MAJOR_BYTES: u8 = 2;
pub(crate) const MAJOR_TEXT: u8 = 3;
pub(crate) const MAJOR_ARRAY: u8 = 4;
pub(crate) const MAJOR_MAP: u8 = 5;
pub(crate) const MAJOR_TAG: u8 = 6;
pub(crate) const MAJOR_SIMPLE: u8 = 7;

// Simple value codes (major type 7 argument)
pub(crate) const SIMPLE_FALSE: u8 = 20;
pub(crate) const SIMPLE_TRUE: u8 = 21;
pub(crate) const SIMPLE_NULL: u8 = 22;
pub(crate) const SIMPLE_UNDEFINED: u8 = 23;

/// Terminates an indefinite-length item.
pub(crate) const BREAK: u8 = 0xFF;

#[derive(Error, Debug)]
pub enum Error {
    /// The source ran out of bytes before a token or payload was complete.
    #[error("input truncated at offset {offset}: {needed} more byte(s) required")]
    Truncated { offset: u64, needed: usize },

    /// Reserved info bits (28-30) or an otherwise malformed header byte.
    #[error("invalid header byte {byte:#04x} at offset {offset}")]
    InvalidToken { byte: u8, offset: u64 },

    /// A text-string payload was not valid UTF-8.
    #[error("text string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: u64 },

    /// Well-formed tokens arranged in a way the format forbids.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// Input the format allows but this implementation does not handle.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// A value the encoder cannot represent on the wire.
    #[error("unencodable value: {0}")]
    Unencodable(&'static str),

    /// Bad arguments at an API boundary, e.g. an empty input buffer.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Container nesting exceeded the decoder's depth limit.
    #[error("nesting depth limit of {0} exceeded")]
    DepthLimit(usize),

    /// A tag the strict tag mapper has no handler for.
    #[error("unrecognized tag {0}")]
    UnknownTag(u64),

    /// Buffer growth failed.
    #[error("allocation failed while growing a buffer")]
    OutOfMemory,

    /// An I/O failure reported by the underlying source or sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Decode exactly one value from `data`.
///
/// Trailing bytes after the first complete value are ignored; callers that
/// expect multiple concatenated values should drive a [`Decoder`] directly
/// and consult [`Decoder::position`] between calls.
pub fn decode(data: &[u8]) -> Result<Value> {
    Decoder::new(SliceReader::new(data)?).decode()
}

/// Decode exactly one value from any [`Reader`] backend.
pub fn decode_from<R: Reader>(reader: R) -> Result<Value> {
    Decoder::new(reader).decode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let value = decode(&[0x01, 0xFF, 0xFF]).unwrap();
        assert_eq!(value, Value::UInt(1));
    }

    #[test]
    fn test_decode_rejects_empty_input() {
        assert!(matches!(decode(&[]), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_encode_to_writes_whole_buffer() {
        let mut sink = Vec::new();
        encode_to(&Value::Text("hello".to_string()), &mut sink).unwrap();
        assert_eq!(sink, encode(&Value::Text("hello".to_string())).unwrap());
    }

    #[test]
    fn test_error_carries_offset() {
        // Array of 2 elements, but only one present.
        let err = decode(&[0x82, 0x01]).unwrap_err();
        match err {
            Error::Truncated { offset, .. } => assert_eq!(offset, 2),
            other => panic!("expected Truncated, got {other:?}"),
        }
    }
}
