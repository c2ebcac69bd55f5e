//! Bignum codec: byte-string payloads under tags 2/3 converted to and from
//! arbitrary-precision integers.
//!
//! `BigInt` is reserved for values outside the signed 64-bit boundary; a
//! bignum-tagged wire value that fits the native variants narrows back to
//! [`Value::UInt`]/[`Value::NegInt`] on decode, and a `BigInt` that fits is
//! emitted as a plain integer header on encode. The boundary is a policy
//! choice, kept identical on both sides so round-trips are stable.

use crate::value::Value;
use crate::{Error, Result};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::ToPrimitive;

/// Longest magnitude payload handled, in bytes. Wider bignums are refused
/// outright rather than truncated.
pub const MAX_PAYLOAD_LEN: usize = 23;

/// Fold a big-endian magnitude payload into an unsigned integer.
pub fn from_be_bytes(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Serialize a non-negative magnitude as big-endian bytes, refusing payloads
/// over [`MAX_PAYLOAD_LEN`].
pub fn to_be_bytes(magnitude: &BigUint) -> Result<Vec<u8>> {
    let bytes = magnitude.to_bytes_be();
    if bytes.len() > MAX_PAYLOAD_LEN {
        return Err(Error::Unsupported("bignum payload longer than 23 bytes"));
    }
    Ok(bytes)
}

/// Build the value for a positive bignum (tag 2), narrowing when it fits.
pub fn unsigned_value(magnitude: BigUint) -> Value {
    match magnitude.to_u64() {
        Some(n) => Value::UInt(n),
        None => Value::BigInt(BigInt::from(magnitude)),
    }
}

/// Build the value for a negative bignum (tag 3): `-1 - magnitude`,
/// narrowing when the `NegInt` argument fits a signed 64-bit value.
pub fn negative_value(magnitude: BigUint) -> Value {
    match magnitude.to_u64() {
        Some(n) if n <= i64::MAX as u64 => Value::NegInt(n),
        _ => Value::BigInt(BigInt::from(-1) - BigInt::from(magnitude)),
    }
}

/// Narrow an arbitrary integer to the native variants when possible.
pub fn narrow(n: BigInt) -> Value {
    if n.sign() == Sign::Minus {
        match (BigInt::from(-1) - &n).to_u64() {
            Some(arg) if arg <= i64::MAX as u64 => Value::NegInt(arg),
            _ => Value::BigInt(n),
        }
    } else {
        match n.to_u64() {
            Some(v) => Value::UInt(v),
            None => Value::BigInt(n),
        }
    }
}

/// How an integer leaves the encoder.
pub(crate) enum IntRepr {
    /// Fits a plain UINT header.
    UInt(u64),
    /// Fits a plain NEGINT header argument.
    NegInt(u64),
    /// Needs a bignum tag with a magnitude payload.
    Big { negative: bool, payload: Vec<u8> },
}

/// Classify a `BigInt` for encoding.
pub(crate) fn repr(n: &BigInt) -> Result<IntRepr> {
    if n.sign() == Sign::Minus {
        // NEGINT carries -1 - argument; the argument is the magnitude less one.
        let arg = BigInt::from(-1) - n;
        match arg.to_u64() {
            Some(v) => Ok(IntRepr::NegInt(v)),
            None => {
                let (_, payload) = arg.to_bytes_be();
                if payload.len() > MAX_PAYLOAD_LEN {
                    return Err(Error::Unsupported("bignum payload longer than 23 bytes"));
                }
                Ok(IntRepr::Big {
                    negative: true,
                    payload,
                })
            }
        }
    } else {
        match n.to_u64() {
            Some(v) => Ok(IntRepr::UInt(v)),
            None => {
                let (_, payload) = n.to_bytes_be();
                if payload.len() > MAX_PAYLOAD_LEN {
                    return Err(Error::Unsupported("bignum payload longer than 23 bytes"));
                }
                Ok(IntRepr::Big {
                    negative: false,
                    payload,
                })
            }
        }
    }
}
