// ABOUTME: Serde Deserializer driven by a decoded BSON value tree.
// ABOUTME: Allows BSON bytes to be decoded into any serde-deserializable Rust type.

use crate::decoder::{Decoder, DecoderConfig};
use crate::error::{Error, Result};
use crate::extjson::decimal128_to_string;
use crate::value::{Document, Value};
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, MapAccess, SeqAccess, Visitor};
use serde::forward_to_deserialize_any;

/// Deserialize a value from a BSON document.
///
/// # Errors
///
/// Returns an error if:
/// - The bytes are not exactly one well-formed BSON document
/// - The document doesn't match the expected type `T`
pub fn from_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    from_slice_with_config(data, DecoderConfig::default())
}

/// Deserialize a value from a BSON document with custom configuration.
///
/// # Errors
///
/// Returns an error if decoding fails under `config`, or if the document
/// doesn't match the expected type `T`.
pub fn from_slice_with_config<T: DeserializeOwned>(data: &[u8], config: DecoderConfig) -> Result<T> {
    let doc = Decoder::with_config(data, config).decode_document()?;
    from_value(Value::Document(doc))
}

/// Deserialize a value from an already decoded tree.
///
/// # Errors
///
/// Returns an error if the tree doesn't match the expected type `T`.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(value)
}

/// Build a document from fixed fields, for wire types that carry several parts.
fn parts<const N: usize>(fields: [(&str, Value); N]) -> Document {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

fn visit_document<'de, V: Visitor<'de>>(doc: Document, visitor: V) -> Result<V::Value> {
    let len = doc.len();
    let mut map = MapDeserializer {
        iter: doc.into_iter(),
        value: None,
    };
    let out = visitor.visit_map(&mut map)?;
    if map.iter.len() == 0 {
        Ok(out)
    } else {
        Err(de::Error::invalid_length(len, &"fewer entries in document"))
    }
}

fn visit_array<'de, V: Visitor<'de>>(arr: Vec<Value>, visitor: V) -> Result<V::Value> {
    let len = arr.len();
    let mut seq = SeqDeserializer {
        iter: arr.into_iter(),
    };
    let out = visitor.visit_seq(&mut seq)?;
    if seq.iter.len() == 0 {
        Ok(out)
    } else {
        Err(de::Error::invalid_length(len, &"fewer elements in array"))
    }
}

impl<'de> de::Deserializer<'de> for Value {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Document(doc) => visit_document(doc, visitor),
            Value::Array(arr) => visit_array(arr, visitor),
            Value::Double(f) => visitor.visit_f64(f),
            Value::String(s) | Value::JsCode(s) | Value::Symbol(s) => visitor.visit_string(s),
            Value::RawString(bytes) | Value::Binary { bytes, .. } => visitor.visit_byte_buf(bytes),
            Value::ObjectId(oid) => visitor.visit_string(oid.to_hex()),
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::DateTime(ms) => visitor.visit_i64(ms),
            Value::Null | Value::Undefined | Value::MinKey | Value::MaxKey => visitor.visit_unit(),
            Value::Regex { pattern, options } => visit_document(
                parts([("pattern", Value::String(pattern)), ("options", Value::String(options))]),
                visitor,
            ),
            Value::DbPointer { namespace, id } => visit_document(
                parts([
                    ("namespace", Value::String(namespace)),
                    ("id", Value::ObjectId(id)),
                ]),
                visitor,
            ),
            Value::JsCodeWithScope { code, scope } => visit_document(
                parts([("code", Value::String(code)), ("scope", Value::Document(scope))]),
                visitor,
            ),
            Value::Int32(n) => visitor.visit_i32(n),
            Value::Timestamp(ts) => visitor.visit_u64(ts.0),
            Value::Int64(n) => visitor.visit_i64(n),
            Value::Decimal128(bytes) => visitor.visit_string(decimal128_to_string(&bytes)),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Null | Value::Undefined => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self {
            // Unit variant: just a string
            Value::String(variant) => visitor.visit_enum(variant.into_deserializer()),
            // Other variants: document with a single key
            Value::Document(doc) => {
                let mut iter = doc.into_iter();
                let (Some((variant, value)), None) = (iter.next(), iter.next()) else {
                    return Err(de::Error::custom("expected document with a single key for enum"));
                };
                visitor.visit_enum(EnumDeserializer { variant, value })
            }
            _ => Err(de::Error::custom("expected string or document for enum")),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct identifier
    }
}

impl<'de> IntoDeserializer<'de, Error> for Value {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        match self.iter.next() {
            Some(value) => seed.deserialize(value).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl<'de> MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(key.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        match self.value.take() {
            Some(value) => seed.deserialize(value),
            None => Err(de::Error::custom("value requested before key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    value: Value,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let variant =
            seed.deserialize(IntoDeserializer::<'de, Error>::into_deserializer(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Value,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            _ => Err(de::Error::custom("expected null for unit variant")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(self.value)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Array(arr) => visit_array(arr, visitor),
            _ => Err(de::Error::custom("expected array for tuple variant")),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.value {
            Value::Document(doc) => visit_document(doc, visitor),
            _ => Err(de::Error::custom("expected document for struct variant")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bson;
    use crate::error::ErrorKind;
    use crate::types::{ObjectId, Timestamp};
    use serde::Deserialize;
    use std::collections::HashMap;

    #[test]
    fn test_deserialize_struct() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Person {
            name: String,
            age: i32,
            scores: Vec<i64>,
            nickname: Option<String>,
            active: bool,
        }

        let value = bson!({
            "name": "Alice",
            "age": 30,
            "scores": [1, 2],
            "nickname": null,
            "active": true
        });
        let person: Person = from_value(value).unwrap();
        assert_eq!(
            person,
            Person {
                name: "Alice".into(),
                age: 30,
                scores: vec![1, 2],
                nickname: None,
                active: true,
            }
        );
    }

    #[test]
    fn test_deserialize_from_slice() {
        // {"i": Int32(42)}
        let bytes = [0x0c, 0, 0, 0, 0x10, b'i', 0, 0x2a, 0, 0, 0, 0];
        let map: HashMap<String, i32> = from_slice(&bytes).unwrap();
        assert_eq!(map["i"], 42);

        let err = from_slice::<HashMap<String, i32>>(&bytes[..11]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InsufficientData);
    }

    #[test]
    fn test_deserialize_wire_types() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Regex {
            pattern: String,
            options: String,
        }

        #[derive(Debug, Deserialize)]
        struct Record {
            id: String,
            when: i64,
            ts: u64,
            re: Regex,
            blob: serde_bytes_like::Bytes,
        }

        let mut doc = Document::new();
        doc.insert("id".into(), Value::ObjectId(ObjectId([1; 12])));
        doc.insert("when".into(), Value::DateTime(1_000));
        doc.insert("ts".into(), Value::Timestamp(Timestamp::new(1, 2)));
        doc.insert(
            "re".into(),
            Value::Regex {
                pattern: "x".into(),
                options: "".into(),
            },
        );
        doc.insert(
            "blob".into(),
            Value::Binary {
                subtype: 0,
                bytes: vec![7, 8],
            },
        );

        let record: Record = from_value(Value::Document(doc)).unwrap();
        assert_eq!(record.id, "010101010101010101010101");
        assert_eq!(record.when, 1_000);
        assert_eq!(record.ts, (1 << 32) | 2);
        assert_eq!(
            record.re,
            Regex {
                pattern: "x".into(),
                options: String::new()
            }
        );
        assert_eq!(record.blob.0, vec![7, 8]);
    }

    #[test]
    fn test_deserialize_enums() {
        #[derive(Debug, Deserialize, PartialEq)]
        enum Shape {
            Empty,
            Circle(f64),
            Rect { w: i32, h: i32 },
        }

        assert_eq!(from_value::<Shape>(bson!("Empty")).unwrap(), Shape::Empty);
        assert_eq!(
            from_value::<Shape>(bson!({ "Circle": 1.5 })).unwrap(),
            Shape::Circle(1.5)
        );
        assert_eq!(
            from_value::<Shape>(bson!({ "Rect": { "w": 2, "h": 3 } })).unwrap(),
            Shape::Rect { w: 2, h: 3 }
        );
        assert!(from_value::<Shape>(bson!({ "Rect": 1, "Circle": 2 })).is_err());
    }

    #[test]
    fn test_enum_from_slice() {
        #[derive(Debug, Deserialize, PartialEq)]
        enum Command {
            Ping,
            Count(i32),
        }

        #[derive(Debug, Deserialize, PartialEq)]
        struct Envelope {
            a: Command,
            b: Command,
        }

        // {"a": "Ping", "b": {"Count": 7}}
        let bytes = [
            0x24, 0x00, 0x00, 0x00, //
            0x02, b'a', 0x00, 0x05, 0x00, 0x00, 0x00, b'P', b'i', b'n', b'g', 0x00, //
            0x03, b'b', 0x00, 0x10, 0x00, 0x00, 0x00, //
            0x10, b'C', b'o', b'u', b'n', b't', 0x00, 0x07, 0x00, 0x00, 0x00, 0x00, //
            0x00,
        ];
        let envelope: Envelope = from_slice(&bytes).unwrap();
        assert_eq!(
            envelope,
            Envelope {
                a: Command::Ping,
                b: Command::Count(7),
            }
        );
    }

    #[test]
    fn test_type_mismatch_is_custom_error() {
        let err = from_value::<Vec<i32>>(bson!("nope")).unwrap_err();
        assert_eq!(err.error_type(), "custom");
    }

    /// Byte-buffer newtype that deserializes through `deserialize_byte_buf`.
    mod serde_bytes_like {
        use serde::de::{Deserialize, Deserializer, Visitor};
        use std::fmt;

        #[derive(Debug)]
        pub struct Bytes(pub Vec<u8>);

        impl<'de> Deserialize<'de> for Bytes {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct BytesVisitor;

                impl Visitor<'_> for BytesVisitor {
                    type Value = Bytes;

                    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        write!(f, "a byte buffer")
                    }

                    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Bytes, E> {
                        Ok(Bytes(v))
                    }
                }

                deserializer.deserialize_byte_buf(BytesVisitor)
            }
        }
    }
}
