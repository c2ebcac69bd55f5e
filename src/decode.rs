//! Recursive-descent decoder: header tokens in, [`Value`] trees out.

use crate::reader::Reader;
use crate::tags::{TAG_NEGATIVE_BIGNUM, TAG_POSITIVE_BIGNUM};
use crate::value::Value;
use crate::{Error, Result, bignum};
use crate::{
    BREAK, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE, MAJOR_TAG,
    MAJOR_TEXT, MAJOR_UNSIGNED, SIMPLE_FALSE, SIMPLE_NULL, SIMPLE_TRUE, SIMPLE_UNDEFINED,
};

/// Container nesting allowed before the decoder gives up on input that is
/// trying to exhaust the stack.
pub const DEFAULT_MAX_DEPTH: usize = 128;

// Claimed container lengths are attacker-controlled; cap the up-front
// reservation and let honest inputs grow from there.
const MAX_PREALLOC: usize = 1024;

/// What a header byte resolved to once its trailing bytes were consumed.
enum Token {
    /// A 64-bit argument (count, length, integer value or tag number).
    Arg(u64),
    /// Major type 7 selected a float width; this is already a whole value.
    Float(f64),
    /// Info 31: indefinite length, terminated by a break byte.
    Indefinite,
}

/// Decoder over any [`Reader`] backend.
pub struct Decoder<R> {
    reader: R,
    max_depth: usize,
}

impl<R: Reader> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the nesting limit.
    pub fn with_max_depth(reader: R, max_depth: usize) -> Self {
        Self { reader, max_depth }
    }

    /// Bytes consumed from the underlying reader so far.
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    /// Consume the decoder, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Decode one complete value.
    pub fn decode(&mut self) -> Result<Value> {
        self.decode_value(0)
    }

    fn decode_value(&mut self, depth: usize) -> Result<Value> {
        let offset = self.reader.position();
        let byte = self.reader.read_one()?;
        self.decode_at(byte, offset, depth)
    }

    fn decode_at(&mut self, byte: u8, offset: u64, depth: usize) -> Result<Value> {
        if depth >= self.max_depth {
            return Err(Error::DepthLimit(self.max_depth));
        }
        let major = byte >> 5;
        let token = self.read_token(major, byte & 0x1F, byte, offset)?;

        match (major, token) {
            (MAJOR_UNSIGNED, Token::Arg(n)) => Ok(Value::UInt(n)),
            (MAJOR_NEGATIVE, Token::Arg(n)) => {
                if n > i64::MAX as u64 {
                    // -1 - n would silently wrap a signed 64-bit value.
                    Ok(bignum::negative_value(n.into()))
                } else {
                    Ok(Value::NegInt(n))
                }
            }
            (MAJOR_BYTES, Token::Arg(n)) => Ok(Value::Bytes(self.read_payload(n)?)),
            (MAJOR_BYTES, Token::Indefinite) => {
                Ok(Value::Bytes(self.read_chunked(MAJOR_BYTES)?))
            }
            (MAJOR_TEXT, Token::Arg(n)) => {
                let raw = self.read_payload(n)?;
                String::from_utf8(raw)
                    .map(Value::Text)
                    .map_err(|_| Error::InvalidUtf8 { offset })
            }
            (MAJOR_TEXT, Token::Indefinite) => {
                let raw = self.read_chunked(MAJOR_TEXT)?;
                String::from_utf8(raw)
                    .map(Value::Text)
                    .map_err(|_| Error::InvalidUtf8 { offset })
            }
            (MAJOR_ARRAY, Token::Arg(n)) => {
                let count = clamp_len(n)?;
                let mut items = Vec::new();
                items.try_reserve(count.min(MAX_PREALLOC))?;
                for _ in 0..count {
                    items.push(self.decode_value(depth + 1)?);
                }
                Ok(Value::Array(items))
            }
            (MAJOR_ARRAY, Token::Indefinite) => {
                let mut items = Vec::new();
                loop {
                    let offset = self.reader.position();
                    let byte = self.reader.read_one()?;
                    if byte == BREAK {
                        return Ok(Value::Array(items));
                    }
                    items.push(self.decode_at(byte, offset, depth + 1)?);
                }
            }
            (MAJOR_MAP, Token::Arg(n)) => {
                let count = clamp_len(n)?;
                let mut pairs = Vec::new();
                pairs.try_reserve(count.min(MAX_PREALLOC))?;
                for _ in 0..count {
                    let key = self.decode_value(depth + 1)?;
                    let value = self.decode_value(depth + 1)?;
                    pairs.push((key, value));
                }
                Ok(Value::Map(pairs))
            }
            (MAJOR_MAP, Token::Indefinite) => {
                let mut pairs = Vec::new();
                loop {
                    let offset = self.reader.position();
                    let byte = self.reader.read_one()?;
                    if byte == BREAK {
                        return Ok(Value::Map(pairs));
                    }
                    let key = self.decode_at(byte, offset, depth + 1)?;
                    let offset = self.reader.position();
                    let byte = self.reader.read_one()?;
                    if byte == BREAK {
                        return Err(Error::ProtocolViolation(
                            "indefinite-length map ended between a key and its value",
                        ));
                    }
                    let value = self.decode_at(byte, offset, depth + 1)?;
                    pairs.push((key, value));
                }
            }
            (MAJOR_TAG, Token::Arg(tag)) => match tag {
                TAG_POSITIVE_BIGNUM => self.decode_bignum(false),
                TAG_NEGATIVE_BIGNUM => self.decode_bignum(true),
                _ => Ok(Value::Tag(tag, Box::new(self.decode_value(depth + 1)?))),
            },
            (MAJOR_SIMPLE, Token::Float(f)) => Ok(Value::Float(f)),
            (MAJOR_SIMPLE, Token::Indefinite) => Err(Error::ProtocolViolation(
                "break byte with no enclosing indefinite-length item",
            )),
            (MAJOR_SIMPLE, Token::Arg(n)) => Ok(match n as u8 {
                SIMPLE_FALSE => Value::Bool(false),
                SIMPLE_TRUE => Value::Bool(true),
                SIMPLE_NULL => Value::Null,
                SIMPLE_UNDEFINED => Value::Undefined,
                code => Value::Simple(code),
            }),
            _ => Err(Error::InvalidToken { byte, offset }),
        }
    }

    /// Resolve the header's info bits, consuming any trailing argument or
    /// float bytes. Floats short-circuit: for major type 7 the widths 25/26/27
    /// select half/single/double precision payloads, not integer arguments.
    fn read_token(&mut self, major: u8, info: u8, byte: u8, offset: u64) -> Result<Token> {
        match info {
            0..=23 => Ok(Token::Arg(info as u64)),
            24 => Ok(Token::Arg(self.reader.read_one()? as u64)),
            25 if major == MAJOR_SIMPLE => {
                let raw = self.read_array::<2>()?;
                Ok(Token::Float(f64::from(half::f16::from_be_bytes(raw))))
            }
            25 => Ok(Token::Arg(
                u16::from_be_bytes(self.read_array::<2>()?) as u64
            )),
            26 if major == MAJOR_SIMPLE => {
                let raw = self.read_array::<4>()?;
                Ok(Token::Float(f64::from(f32::from_be_bytes(raw))))
            }
            26 => Ok(Token::Arg(
                u32::from_be_bytes(self.read_array::<4>()?) as u64
            )),
            27 if major == MAJOR_SIMPLE => {
                let raw = self.read_array::<8>()?;
                Ok(Token::Float(f64::from_be_bytes(raw)))
            }
            27 => Ok(Token::Arg(u64::from_be_bytes(self.read_array::<8>()?))),
            31 => Ok(Token::Indefinite),
            // 28-30 are reserved
            _ => Err(Error::InvalidToken { byte, offset }),
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.reader.read_exact(N)?);
        Ok(out)
    }

    fn read_payload(&mut self, len: u64) -> Result<Vec<u8>> {
        let len = clamp_len(len)?;
        let data = self.reader.read_exact(len)?;
        let mut out = Vec::new();
        out.try_reserve_exact(data.len())?;
        out.extend_from_slice(data);
        Ok(out)
    }

    /// Concatenate the definite-length chunks of an indefinite-length string
    /// until the break byte.
    fn read_chunked(&mut self, major: u8) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let offset = self.reader.position();
            let byte = self.reader.read_one()?;
            if byte == BREAK {
                return Ok(out);
            }
            if byte >> 5 != major {
                return Err(Error::ProtocolViolation(
                    "indefinite-length string chunk has a different major type",
                ));
            }
            let len = match self.read_token(major, byte & 0x1F, byte, offset)? {
                Token::Arg(n) => clamp_len(n)?,
                _ => {
                    return Err(Error::ProtocolViolation(
                        "indefinite-length string chunk is itself indefinite",
                    ));
                }
            };
            let chunk = self.reader.read_exact(len)?;
            out.try_reserve(chunk.len())?;
            out.extend_from_slice(chunk);
        }
    }

    /// Decode the byte-string payload of a bignum tag straight into an
    /// integer, without materializing an intermediate `Bytes` value.
    fn decode_bignum(&mut self, negative: bool) -> Result<Value> {
        let offset = self.reader.position();
        let byte = self.reader.read_one()?;
        if byte >> 5 != MAJOR_BYTES {
            return Err(Error::ProtocolViolation(
                "bignum tag must be followed by a byte string",
            ));
        }
        let len = match byte & 0x1F {
            info @ 0..=23 => info as usize,
            31 => {
                return Err(Error::ProtocolViolation(
                    "bignum payload must be definite-length",
                ));
            }
            24..=27 => return Err(Error::Unsupported("bignum payload longer than 23 bytes")),
            _ => return Err(Error::InvalidToken { byte, offset }),
        };
        let magnitude = bignum::from_be_bytes(self.reader.read_exact(len)?);
        Ok(if negative {
            bignum::negative_value(magnitude)
        } else {
            bignum::unsigned_value(magnitude)
        })
    }
}

fn clamp_len(len: u64) -> Result<usize> {
    usize::try_from(len).map_err(|_| Error::Unsupported("length exceeds addressable memory"))
}
