//! Registered tag numbers and a pluggable tag-rewriting layer.
//!
//! The decoder handles bignum tags itself; everything else surfaces as
//! [`Value::Tag`]. A [`TagMapper`] sits on top of the raw codec and rewrites
//! tagged values through user-registered handlers, so applications can map
//! tags to domain values (timestamps, URIs, custom records) without touching
//! the wire layer.

use crate::value::Value;
use crate::{Error, Result};

/// Standard date/time string (RFC 3339 text).
pub const TAG_DATETIME_STRING: u64 = 0;
/// Epoch-based date/time (integer or float seconds).
pub const TAG_EPOCH_DATETIME: u64 = 1;
/// Unsigned bignum: byte string holding a big-endian magnitude.
pub const TAG_POSITIVE_BIGNUM: u64 = 2;
/// Negative bignum: `-1 - magnitude`.
pub const TAG_NEGATIVE_BIGNUM: u64 = 3;
/// Decimal fraction: `[exponent, mantissa]` pair.
pub const TAG_DECIMAL_FRACTION: u64 = 4;
/// Bigfloat: `[exponent, mantissa]` pair with a base-2 exponent.
pub const TAG_BIGFLOAT: u64 = 5;
/// URI text string.
pub const TAG_URI: u64 = 32;
/// base64url-encoded text string.
pub const TAG_BASE64URL: u64 = 33;
/// base64-encoded text string.
pub const TAG_BASE64: u64 = 34;
/// MIME message text string.
pub const TAG_MIME: u64 = 36;

type DecodeFn = dyn Fn(Value) -> Result<Value>;
type EncodeFn = dyn Fn(&Value) -> Option<Value>;

/// A handler for one tag number.
///
/// `decode` turns a tag's payload into the application value; `encode` is
/// its inverse, returning the payload to wrap when it recognizes a value
/// (and `None` when it doesn't claim it).
pub struct TagHandler {
    tag: u64,
    decode: Box<DecodeFn>,
    encode: Box<EncodeFn>,
}

impl TagHandler {
    pub fn new<D, E>(tag: u64, decode: D, encode: E) -> Self
    where
        D: Fn(Value) -> Result<Value> + 'static,
        E: Fn(&Value) -> Option<Value> + 'static,
    {
        Self {
            tag,
            decode: Box::new(decode),
            encode: Box::new(encode),
        }
    }
}

/// Rewrites tagged values through registered handlers after decoding and
/// before encoding.
///
/// In strict mode a tag with no registered handler is an error; otherwise
/// unknown tags pass through untouched as [`Value::Tag`].
#[derive(Default)]
pub struct TagMapper {
    handlers: Vec<TagHandler>,
    strict: bool,
}

impl TagMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse tags with no registered handler instead of passing them through.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn register(&mut self, handler: TagHandler) {
        self.handlers.push(handler);
    }

    fn handler(&self, tag: u64) -> Option<&TagHandler> {
        self.handlers.iter().find(|h| h.tag == tag)
    }

    /// Rewrite tags in a decoded tree, innermost first.
    pub fn apply(&self, value: Value) -> Result<Value> {
        match value {
            Value::Tag(tag, inner) => {
                let inner = self.apply(*inner)?;
                match self.handler(tag) {
                    Some(h) => (h.decode)(inner),
                    None if self.strict => Err(Error::UnknownTag(tag)),
                    None => Ok(Value::Tag(tag, Box::new(inner))),
                }
            }
            Value::Array(items) => Ok(Value::Array(
                items
                    .into_iter()
                    .map(|v| self.apply(v))
                    .collect::<Result<_>>()?,
            )),
            Value::Map(pairs) => Ok(Value::Map(
                pairs
                    .into_iter()
                    .map(|(k, v)| Ok((self.apply(k)?, self.apply(v)?)))
                    .collect::<Result<_>>()?,
            )),
            other => Ok(other),
        }
    }

    /// Wrap application values back into tags before encoding.
    ///
    /// The first handler to claim a value wins, and its payload is taken
    /// as-is; only unclaimed containers are walked.
    pub fn unapply(&self, value: Value) -> Result<Value> {
        for h in &self.handlers {
            if let Some(payload) = (h.encode)(&value) {
                return Ok(Value::Tag(h.tag, Box::new(payload)));
            }
        }
        match value {
            Value::Array(items) => Ok(Value::Array(
                items
                    .into_iter()
                    .map(|v| self.unapply(v))
                    .collect::<Result<_>>()?,
            )),
            Value::Map(pairs) => Ok(Value::Map(
                pairs
                    .into_iter()
                    .map(|(k, v)| Ok((self.unapply(k)?, self.unapply(v)?)))
                    .collect::<Result<_>>()?,
            )),
            Value::Tag(tag, inner) => Ok(Value::Tag(tag, Box::new(self.unapply(*inner)?))),
            other => Ok(other),
        }
    }

    /// Decode one value and run it through [`TagMapper::apply`].
    pub fn decode(&self, data: &[u8]) -> Result<Value> {
        self.apply(crate::decode(data)?)
    }

    /// Run a value through [`TagMapper::unapply`] and encode it.
    pub fn encode(&self, value: Value) -> Result<Vec<u8>> {
        crate::encode::encode(&self.unapply(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A toy timestamp type carried as tag 1 with integer seconds.
    fn epoch_mapper() -> TagMapper {
        let mut mapper = TagMapper::new();
        mapper.register(TagHandler::new(
            TAG_EPOCH_DATETIME,
            |payload| match payload {
                Value::UInt(secs) => Ok(Value::Map(vec![(
                    Value::Text("epoch".to_string()),
                    Value::UInt(secs),
                )])),
                _ => Err(Error::ProtocolViolation("epoch tag expects an integer")),
            },
            |value| {
                let pairs = value.as_map()?;
                match pairs {
                    [(Value::Text(k), Value::UInt(secs))] if k == "epoch" => {
                        Some(Value::UInt(*secs))
                    }
                    _ => None,
                }
            },
        ));
        mapper
    }

    #[test]
    fn test_handler_rewrites_tagged_value() {
        let mapper = epoch_mapper();
        // c1 1a 514b67b0 = tag 1, unsigned 1363896240
        let value = mapper.decode(&[0xC1, 0x1A, 0x51, 0x4B, 0x67, 0xB0]).unwrap();
        assert_eq!(
            value.map_get(&Value::Text("epoch".to_string())),
            Some(&Value::UInt(1363896240))
        );
    }

    #[test]
    fn test_unapply_inverts_apply() {
        let mapper = epoch_mapper();
        let wire = vec![0xC1, 0x18, 0x64];
        let value = mapper.decode(&wire).unwrap();
        assert_eq!(mapper.encode(value).unwrap(), wire);
    }

    #[test]
    fn test_unknown_tags_pass_through_by_default() {
        let mapper = TagMapper::new();
        let value = mapper.decode(&[0xD8, 0x20, 0x61, 0x61]).unwrap();
        assert_eq!(
            value,
            Value::Tag(TAG_URI, Box::new(Value::Text("a".to_string())))
        );
    }

    #[test]
    fn test_strict_mode_refuses_unknown_tags() {
        let mapper = TagMapper::new().strict();
        assert!(matches!(
            mapper.decode(&[0xD8, 0x20, 0x61, 0x61]),
            Err(Error::UnknownTag(32))
        ));
    }

    #[test]
    fn test_apply_reaches_nested_tags() {
        let mapper = epoch_mapper();
        // [tag 1(100)]
        let value = mapper.decode(&[0x81, 0xC1, 0x18, 0x64]).unwrap();
        let items = value.as_array().unwrap();
        assert!(items[0].is_map());
    }
}
