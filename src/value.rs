// ABOUTME: Decoded BSON value tree.
// ABOUTME: One variant per BSON element type; documents preserve wire order via IndexMap.

use crate::types::{element_type, BinarySubtype, ObjectId, Timestamp};
use indexmap::IndexMap;
use std::fmt;

/// An ordered key → value mapping. Iteration follows wire order.
pub type Document = IndexMap<String, Value>;

/// A decoded BSON value.
///
/// Each variant carries exactly what the wire format stores; the decoder
/// never converts between variants.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// An embedded document (0x03), or the top-level document.
    Document(Document),
    /// An array (0x04); wire keys are discarded.
    Array(Vec<Value>),
    /// 64-bit IEEE 754 float (0x01).
    Double(f64),
    /// UTF-8 string (0x02).
    String(String),
    /// String bytes returned without UTF-8 validation (0x02, validation disabled).
    RawString(Vec<u8>),
    /// Binary data (0x05) with its subtype byte preserved verbatim.
    Binary { subtype: u8, bytes: Vec<u8> },
    /// Deprecated undefined (0x06).
    Undefined,
    ObjectId(ObjectId),
    Boolean(bool),
    /// Milliseconds since the Unix epoch (0x09).
    DateTime(i64),
    #[default]
    Null,
    Regex { pattern: String, options: String },
    /// Deprecated DBPointer (0x0c).
    DbPointer { namespace: String, id: ObjectId },
    JsCode(String),
    /// Deprecated symbol (0x0e).
    Symbol(String),
    JsCodeWithScope { code: String, scope: Document },
    Int32(i32),
    Timestamp(Timestamp),
    Int64(i64),
    /// IEEE 754-2008 decimal128 in its 16 little-endian wire bytes (0x13).
    Decimal128([u8; 16]),
    MinKey,
    MaxKey,
}

impl Value {
    /// The wire type code this value was decoded from.
    #[must_use]
    pub fn element_type(&self) -> u8 {
        match self {
            Value::Document(_) => element_type::DOCUMENT,
            Value::Array(_) => element_type::ARRAY,
            Value::Double(_) => element_type::DOUBLE,
            Value::String(_) | Value::RawString(_) => element_type::STRING,
            Value::Binary { .. } => element_type::BINARY,
            Value::Undefined => element_type::UNDEFINED,
            Value::ObjectId(_) => element_type::OBJECT_ID,
            Value::Boolean(_) => element_type::BOOLEAN,
            Value::DateTime(_) => element_type::DATE_TIME,
            Value::Null => element_type::NULL,
            Value::Regex { .. } => element_type::REGEX,
            Value::DbPointer { .. } => element_type::DB_POINTER,
            Value::JsCode(_) => element_type::JS_CODE,
            Value::Symbol(_) => element_type::SYMBOL,
            Value::JsCodeWithScope { .. } => element_type::JS_CODE_WITH_SCOPE,
            Value::Int32(_) => element_type::INT32,
            Value::Timestamp(_) => element_type::TIMESTAMP,
            Value::Int64(_) => element_type::INT64,
            Value::Decimal128(_) => element_type::DECIMAL128,
            Value::MinKey => element_type::MIN_KEY,
            Value::MaxKey => element_type::MAX_KEY,
        }
    }

    /// Returns true if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns true for the three numeric wire types.
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int32(_) | Value::Int64(_) | Value::Double(_))
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns Int32 or Int64 as i64. Doubles and dates are not integers here.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(n) => Some(i64::from(*n)),
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the text of a String value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the payload of a Binary value.
    #[must_use]
    pub fn as_binary(&self) -> Option<(BinarySubtype, &[u8])> {
        match self {
            Value::Binary { subtype, bytes } => Some((BinarySubtype::from(*subtype), bytes)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Value::ObjectId(oid) => Some(*oid),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<i64> {
        match self {
            Value::DateTime(ms) => Some(*ms),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    /// Index into an array. Returns None if not an array or index out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|a| a.get(index))
    }

    /// Look up a key in a document. Returns None if not a document or key not found.
    #[must_use]
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.as_document().and_then(|d| d.get(key))
    }
}

fn write_document(f: &mut fmt::Formatter<'_>, doc: &Document) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (k, v)) in doc.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "\"{}\": {}", k.escape_default(), v)?;
    }
    write!(f, "}}")
}

// Human-readable, shell-like rendering. Use the Serialize impl for Extended JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Document(d) => write_document(f, d),
            Value::Array(a) => {
                write!(f, "[")?;
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Double(n) => {
                if n.is_finite() {
                    write!(f, "{n:?}")
                } else if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_sign_positive() {
                    write!(f, "Infinity")
                } else {
                    write!(f, "-Infinity")
                }
            }
            Value::String(s) => write!(f, "\"{}\"", s.escape_default()),
            Value::RawString(b) => write!(f, "\"{}\"", String::from_utf8_lossy(b).escape_default()),
            Value::Binary { subtype, bytes } => {
                write!(f, "BinData({subtype}, {} bytes)", bytes.len())
            }
            Value::Undefined => write!(f, "undefined"),
            Value::ObjectId(oid) => write!(f, "ObjectId(\"{oid}\")"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::DateTime(ms) => write!(f, "Date({ms})"),
            Value::Null => write!(f, "null"),
            Value::Regex { pattern, options } => write!(f, "/{pattern}/{options}"),
            Value::DbPointer { namespace, id } => {
                write!(f, "DBPointer(\"{}\", \"{id}\")", namespace.escape_default())
            }
            Value::JsCode(code) => write!(f, "Code(\"{}\")", code.escape_default()),
            Value::Symbol(s) => write!(f, "Symbol(\"{}\")", s.escape_default()),
            Value::JsCodeWithScope { code, scope } => {
                write!(f, "Code(\"{}\", ", code.escape_default())?;
                write_document(f, scope)?;
                write!(f, ")")
            }
            Value::Int32(n) => write!(f, "{n}"),
            Value::Timestamp(ts) => write!(f, "Timestamp({}, {})", ts.time(), ts.increment()),
            Value::Int64(n) => write!(f, "NumberLong({n})"),
            Value::Decimal128(bytes) => {
                write!(f, "NumberDecimal(\"{}\")", crate::extjson::decimal128_to_string(bytes))
            }
            Value::MinKey => write!(f, "MinKey"),
            Value::MaxKey => write!(f, "MaxKey"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<ObjectId> for Value {
    fn from(oid: ObjectId) -> Self {
        Value::ObjectId(oid)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::Array(iter.into_iter().map(Into::into).collect())
    }
}

/// Macro for building BSON value trees.
///
/// Document keys keep the order they are written in.
///
/// # Examples
///
/// ```rust
/// use bsonkit::bson;
///
/// let value = bson!({
///     "name": "test",
///     "values": [1, 2, 3],
///     "active": true
/// });
/// assert_eq!(value.get_key("name").and_then(|v| v.as_str()), Some("test"));
/// ```
#[macro_export]
macro_rules! bson {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Boolean(true)
    };
    (false) => {
        $crate::Value::Boolean(false)
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![ $( $crate::bson!($elem) ),* ])
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            #[allow(unused_mut)]
            let mut doc = $crate::Document::new();
            $(
                doc.insert(String::from($key), $crate::bson!($value));
            )*
            $crate::Value::Document(doc)
        }
    };

    ($other:expr) => {
        $crate::Value::from($other)
    };
}
