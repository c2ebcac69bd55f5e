use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};
use num_bigint::BigInt;
use std::fmt;

/// Dynamic CBOR value type for working with untyped CBOR data
///
/// This type can represent any CBOR value without knowing its type at compile time.
/// Container values own their children outright; a decoded tree is a plain
/// tree, never a graph.
///
/// # Example
/// ```
/// use cborium::{Value, encode, decode};
///
/// let value = Value::Map(vec![
///     (Value::Text("name".to_string()), Value::Text("Alice".to_string())),
///     (Value::Text("age".to_string()), Value::UInt(30)),
/// ]);
///
/// let bytes = encode(&value).unwrap();
/// let decoded = decode(&bytes).unwrap();
/// assert_eq!(value, decoded);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    /// Undefined value (simple value 23)
    Undefined,
    /// Boolean value
    Bool(bool),
    /// Unsigned integer (major type 0)
    UInt(u64),
    /// Negative integer `-1 - n` (major type 1); `n` never exceeds `i64::MAX`,
    /// larger wire arguments are promoted to [`Value::BigInt`]
    NegInt(u64),
    /// Integer outside the signed 64-bit boundary, carried by tags 2/3
    BigInt(BigInt),
    /// Floating point value (half/single widen to double on decode)
    Float(f64),
    /// Byte string
    Bytes(Vec<u8>),
    /// Text string
    Text(String),
    /// Array of values
    Array(Vec<Value>),
    /// Key/value pairs in encounter order; duplicate keys are permitted
    Map(Vec<(Value, Value)>),
    /// Tagged value (tag number, boxed content)
    Tag(u64, Box<Value>),
    /// Simple value codes other than 20/21/22/23
    Simple(u8),
}

impl Value {
    /// Returns true if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if the value is undefined
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if the value is a boolean
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns true if the value is any integer variant
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::UInt(_) | Value::NegInt(_) | Value::BigInt(_))
    }

    /// Returns true if the value is a float
    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    /// Returns true if the value is bytes
    pub fn is_bytes(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    /// Returns true if the value is text
    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }

    /// Returns true if the value is an array
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Returns true if the value is a map
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Returns true if the value is tagged
    pub fn is_tag(&self) -> bool {
        matches!(self, Value::Tag(_, _))
    }

    /// Returns the value as a boolean, if it is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an unsigned 64-bit integer, if it fits
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as a signed 64-bit integer, if it fits
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::UInt(n) => i64::try_from(*n).ok(),
            Value::NegInt(n) => i64::try_from(*n).ok().map(|n| -1 - n),
            _ => None,
        }
    }

    /// Returns the value as a float, if it is one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as bytes, if it is a byte string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value as text, if it is a text string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an array, if it is one
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the map's key/value pairs in encounter order, if it is a map
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the tag number and inner value, if this is a tagged value
    pub fn as_tag(&self) -> Option<(u64, &Value)> {
        match self {
            Value::Tag(tag, value) => Some((*tag, value)),
            _ => None,
        }
    }

    /// Look up a map key, resolving duplicates last-write-wins.
    pub fn map_get(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Map(pairs) => pairs.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Widen any integer variant to a `BigInt`.
    pub fn to_bigint(&self) -> Option<BigInt> {
        match self {
            Value::UInt(n) => Some(BigInt::from(*n)),
            Value::NegInt(n) => Some(BigInt::from(-1) - BigInt::from(*n)),
            Value::BigInt(n) => Some(n.clone()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        if v >= 0 {
            Value::UInt(v as u64)
        } else {
            Value::NegInt((-1 - v) as u64)
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Self {
        // Keep the native/bignum boundary consistent with the codec: only
        // values outside the signed 64-bit representable range stay BigInt.
        crate::bignum::narrow(v)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null | Value::Undefined => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::UInt(n) => serializer.serialize_u64(*n),
            Value::NegInt(n) => match i64::try_from(*n) {
                Ok(n) => serializer.serialize_i64(-1 - n),
                Err(_) => serializer.serialize_i128(-1 - i128::from(*n)),
            },
            Value::BigInt(n) => serializer.collect_str(n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Array(a) => serializer.collect_seq(a),
            Value::Map(m) => serializer.collect_map(m.iter().map(|(k, v)| (k, v))),
            Value::Tag(_tag, value) => {
                // Tag numbers have no equivalent in the serde data model;
                // serialize the inner value
                value.serialize(serializer)
            }
            Value::Simple(n) => serializer.serialize_u8(*n),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid CBOR value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
                if value >= 0 {
                    Ok(Value::UInt(value as u64))
                } else {
                    Ok(Value::NegInt((-1 - value) as u64))
                }
            }

            fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
                Ok(Value::UInt(value))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Value, E> {
                Ok(Value::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Text(value.to_owned()))
            }

            fn visit_string<E>(self, value: String) -> Result<Value, E> {
                Ok(Value::Text(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Value, E>
            where
                E: de::Error,
            {
                Ok(Value::Bytes(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Value, E> {
                Ok(Value::Bytes(value))
            }

            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_seq<V>(self, mut visitor: V) -> Result<Value, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = visitor.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<V>(self, mut visitor: V) -> Result<Value, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut pairs = Vec::new();
                while let Some((key, value)) = visitor.next_entry()? {
                    pairs.push((key, value));
                }
                Ok(Value::Map(pairs))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode, encode};

    #[test]
    fn test_value_null() {
        let value = Value::Null;
        assert!(value.is_null());

        let bytes = encode(&value).unwrap();
        assert_eq!(decode(&bytes).unwrap(), value);
    }

    #[test]
    fn test_value_bool() {
        let value = Value::Bool(true);
        assert!(value.is_bool());
        assert_eq!(value.as_bool(), Some(true));

        let bytes = encode(&value).unwrap();
        assert_eq!(decode(&bytes).unwrap(), value);
    }

    #[test]
    fn test_value_integers() {
        assert_eq!(Value::from(42u64), Value::UInt(42));
        assert_eq!(Value::from(-42i64), Value::NegInt(41));
        assert_eq!(Value::NegInt(41).as_i64(), Some(-42));
        assert_eq!(Value::UInt(42).as_i64(), Some(42));
        assert_eq!(Value::from(i64::MIN), Value::NegInt(i64::MAX as u64));
        assert_eq!(Value::NegInt(i64::MAX as u64).as_i64(), Some(i64::MIN));
    }

    #[test]
    fn test_bigint_from_narrows_to_native() {
        assert_eq!(Value::from(BigInt::from(7)), Value::UInt(7));
        assert_eq!(Value::from(BigInt::from(-8)), Value::NegInt(7));
        let wide = BigInt::from(u64::MAX) + 1;
        assert!(matches!(Value::from(wide), Value::BigInt(_)));
    }

    #[test]
    fn test_map_get_last_write_wins() {
        let map = Value::Map(vec![
            (Value::Text("k".to_string()), Value::UInt(1)),
            (Value::Text("k".to_string()), Value::UInt(2)),
        ]);
        assert_eq!(
            map.map_get(&Value::Text("k".to_string())),
            Some(&Value::UInt(2))
        );
        assert_eq!(map.as_map().unwrap().len(), 2);
    }

    #[test]
    fn test_value_to_json() {
        let value = Value::Map(vec![
            (Value::Text("name".to_string()), Value::Text("Alice".to_string())),
            (Value::Text("age".to_string()), Value::UInt(30)),
            (Value::Text("tags".to_string()),
             Value::Array(vec![Value::UInt(1), Value::NegInt(1)])),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"name":"Alice","age":30,"tags":[1,-2]}"#);
    }

    #[test]
    fn test_value_from_json() {
        let value: Value = serde_json::from_str(r#"{"a":[1,-2,true,null]}"#).unwrap();
        assert_eq!(
            value,
            Value::Map(vec![(
                Value::Text("a".to_string()),
                Value::Array(vec![
                    Value::UInt(1),
                    Value::NegInt(1),
                    Value::Bool(true),
                    Value::Null,
                ])
            )])
        );
    }

    #[test]
    fn test_tag_serializes_inner_value() {
        let value = Value::Tag(32, Box::new(Value::Text("https://example.com".to_string())));
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#""https://example.com""#);
    }
}
