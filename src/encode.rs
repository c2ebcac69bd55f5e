//! Two-pass value encoder.
//!
//! Pass 1 ([`encoded_len`]) walks the tree computing the exact output size
//! and surfaces every condition that would make the value unencodable; pass 2
//! allocates the buffer once and writes, so nothing ever reallocates and the
//! result is exactly sized. Header emission picks the minimal-width argument
//! encoding, the precise inverse of the decoder's argument parsing.
//!
//! The encoder always emits definite-length containers and always widens
//! floats to 8-byte doubles.

use crate::bignum::{self, IntRepr};
use crate::value::Value;
use crate::{Error, Result};
use crate::{
    MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE, MAJOR_TAG, MAJOR_TEXT,
    MAJOR_UNSIGNED, SIMPLE_FALSE, SIMPLE_NULL, SIMPLE_TRUE, SIMPLE_UNDEFINED,
};
use crate::tags::{TAG_NEGATIVE_BIGNUM, TAG_POSITIVE_BIGNUM};

/// Encode one value into a minimal exact-length buffer.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let len = encoded_len(value)?;
    let len = usize::try_from(len)
        .map_err(|_| Error::Unencodable("encoded size exceeds addressable memory"))?;
    let mut out = Vec::new();
    out.try_reserve_exact(len)?;
    write_value(&mut out, value);
    debug_assert_eq!(out.len(), len);
    Ok(out)
}

/// Encode one value, then hand the buffer to `writer`.
pub fn encode_to<W: std::io::Write>(value: &Value, writer: &mut W) -> Result<()> {
    let buf = encode(value)?;
    writer.write_all(&buf)?;
    Ok(())
}

/// Exact number of bytes [`encode`] will produce for `value`.
///
/// This is the measuring pass: every `Unencodable`/`Unsupported` condition is
/// reported here, before any output buffer exists.
pub fn encoded_len(value: &Value) -> Result<u64> {
    Ok(match value {
        Value::Null | Value::Undefined | Value::Bool(_) => 1,
        Value::UInt(n) | Value::NegInt(n) => header_len(*n),
        Value::BigInt(n) => match bignum::repr(n)? {
            IntRepr::UInt(v) | IntRepr::NegInt(v) => header_len(v),
            IntRepr::Big { payload, .. } => {
                header_len(TAG_POSITIVE_BIGNUM) + header_len(payload.len() as u64)
                    + payload.len() as u64
            }
        },
        Value::Float(_) => 9,
        Value::Bytes(b) => header_len(b.len() as u64) + b.len() as u64,
        Value::Text(s) => header_len(s.len() as u64) + s.len() as u64,
        Value::Array(items) => {
            let mut total = header_len(items.len() as u64);
            for item in items {
                total += encoded_len(item)?;
            }
            total
        }
        Value::Map(pairs) => {
            let mut total = header_len(pairs.len() as u64);
            for (key, value) in pairs {
                total += encoded_len(key)?;
                total += encoded_len(value)?;
            }
            total
        }
        Value::Tag(tag, inner) => header_len(*tag) + encoded_len(inner)?,
        Value::Simple(code) => match code {
            0..=23 => 1,
            // 24..=31 are reserved in the two-byte form
            24..=31 => return Err(Error::Unencodable("reserved simple value 24..=31")),
            _ => 2,
        },
    })
}

// Writing pass. Infallible: every failing condition was rejected by
// `encoded_len` before the buffer was allocated.
fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => out.push((MAJOR_SIMPLE << 5) | SIMPLE_NULL),
        Value::Undefined => out.push((MAJOR_SIMPLE << 5) | SIMPLE_UNDEFINED),
        Value::Bool(true) => out.push((MAJOR_SIMPLE << 5) | SIMPLE_TRUE),
        Value::Bool(false) => out.push((MAJOR_SIMPLE << 5) | SIMPLE_FALSE),
        Value::UInt(n) => write_header(out, MAJOR_UNSIGNED, *n),
        Value::NegInt(n) => write_header(out, MAJOR_NEGATIVE, *n),
        Value::BigInt(n) => match bignum::repr(n) {
            Ok(IntRepr::UInt(v)) => write_header(out, MAJOR_UNSIGNED, v),
            Ok(IntRepr::NegInt(v)) => write_header(out, MAJOR_NEGATIVE, v),
            Ok(IntRepr::Big { negative, payload }) => {
                let tag = if negative {
                    TAG_NEGATIVE_BIGNUM
                } else {
                    TAG_POSITIVE_BIGNUM
                };
                write_header(out, MAJOR_TAG, tag);
                write_header(out, MAJOR_BYTES, payload.len() as u64);
                out.extend_from_slice(&payload);
            }
            Err(_) => unreachable!("oversized bignum rejected by the measuring pass"),
        },
        Value::Float(f) => {
            out.push((MAJOR_SIMPLE << 5) | 27);
            out.extend_from_slice(&f.to_be_bytes());
        }
        Value::Bytes(b) => {
            write_header(out, MAJOR_BYTES, b.len() as u64);
            out.extend_from_slice(b);
        }
        Value::Text(s) => {
            write_header(out, MAJOR_TEXT, s.len() as u64);
            out.extend_from_slice(s.as_bytes());
        }
        Value::Array(items) => {
            write_header(out, MAJOR_ARRAY, items.len() as u64);
            for item in items {
                write_value(out, item);
            }
        }
        Value::Map(pairs) => {
            write_header(out, MAJOR_MAP, pairs.len() as u64);
            for (key, value) in pairs {
                write_value(out, key);
                write_value(out, value);
            }
        }
        Value::Tag(tag, inner) => {
            write_header(out, MAJOR_TAG, *tag);
            write_value(out, inner);
        }
        Value::Simple(code) => {
            if *code <= 23 {
                out.push((MAJOR_SIMPLE << 5) | code);
            } else {
                out.push((MAJOR_SIMPLE << 5) | 24);
                out.push(*code);
            }
        }
    }
}

fn write_header(out: &mut Vec<u8>, major: u8, value: u64) {
    if value < 24 {
        out.push((major << 5) | value as u8);
    } else if value < 256 {
        out.push((major << 5) | 24);
        out.push(value as u8);
    } else if value < 65536 {
        out.push((major << 5) | 25);
        out.extend_from_slice(&(value as u16).to_be_bytes());
    } else if value < 4294967296 {
        out.push((major << 5) | 26);
        out.extend_from_slice(&(value as u32).to_be_bytes());
    } else {
        out.push((major << 5) | 27);
        out.extend_from_slice(&value.to_be_bytes());
    }
}

fn header_len(value: u64) -> u64 {
    if value < 24 {
        1
    } else if value < 256 {
        2
    } else if value < 65536 {
        3
    } else if value < 4294967296 {
        5
    } else {
        9
    }
}
