// ABOUTME: Strict BSON document decoder.
// ABOUTME: Tag-dispatched element reader over length-framed subcursors with depth limiting.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_sign_loss)]

use crate::cursor::Cursor;
use crate::error::{Error, ErrorKind, Result};
use crate::types::{element_type, limits, ObjectId, Timestamp};
use crate::value::{Document, Value};
use indexmap::map::Entry;

/// Configuration options for the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum container nesting below the root document (default: 100)
    pub max_depth: u32,
    /// Validate String elements as UTF-8 (default: true).
    /// When false they decode to `Value::RawString`. Only 0x02 String payloads
    /// are affected: keys, regexes, JSCode, Symbol and DBPointer namespaces are
    /// always validated.
    pub validate_utf8: bool,
    /// Require array keys to be "0", "1", "2", ... in order (default: false)
    pub array_strict_indices: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: limits::MAX_DEPTH,
            validate_utf8: true,
            array_strict_indices: false,
        }
    }
}

/// A BSON decoder over a borrowed byte slice.
///
/// The decoder copies every string and blob out of the input, so the returned
/// tree does not borrow from `data`.
pub struct Decoder<'a> {
    data: &'a [u8],
    config: DecoderConfig,
    /// Nesting level of the container currently being read; the root is 0.
    depth: u32,
}

impl<'a> Decoder<'a> {
    /// Create a new decoder for the given data.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, DecoderConfig::default())
    }

    /// Create a new decoder with custom configuration.
    #[must_use]
    pub fn with_config(data: &'a [u8], config: DecoderConfig) -> Self {
        Self {
            data,
            config,
            depth: 0,
        }
    }

    /// Get the decoder configuration.
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode the input as exactly one top-level document.
    ///
    /// The declared length must equal the input length: a longer declaration
    /// fails with `InsufficientData`, a shorter one with `TrailingBytes`.
    pub fn decode_document(&mut self) -> Result<Document> {
        self.depth = 0;
        let mut cur = Cursor::new(self.data);

        let declared = cur.clone().i32_le()?;
        if declared >= limits::MIN_DOCUMENT_SIZE as i32 && (declared as usize) < self.data.len() {
            return Err(Error::new(ErrorKind::TrailingBytes, declared as usize)
                .with_context(format!("document declares {declared} of {} bytes", self.data.len())));
        }

        let doc = self.read_document(&mut cur)?;
        if !cur.is_empty() {
            return Err(cur.error(ErrorKind::TrailingBytes));
        }
        Ok(doc)
    }

    // =========================================================================
    // Container readers
    // =========================================================================

    /// Read a length-framed run of elements, handing each one to `on_element`
    /// together with the absolute offset of its key.
    fn read_container<F>(&mut self, cur: &mut Cursor<'a>, mut on_element: F) -> Result<()>
    where
        F: FnMut(usize, &'a str, Value) -> Result<()>,
    {
        let start = cur.position();
        let total = cur.i32_le()?;
        if total < limits::MIN_DOCUMENT_SIZE as i32 {
            return Err(Error::new(ErrorKind::InvalidDocumentLength, start)
                .with_context(format!("declared length {total}")));
        }

        let mut body = cur.subcursor(total as usize - 4)?;
        while let Some((key_offset, key, value)) = self.read_element(&mut body)? {
            on_element(key_offset, key, value)?;
        }

        if !body.is_empty() {
            return Err(body.error(ErrorKind::TrailingBytes));
        }
        Ok(())
    }

    fn read_document(&mut self, cur: &mut Cursor<'a>) -> Result<Document> {
        let mut doc = Document::new();
        self.read_container(cur, |key_offset, key, value| {
            match doc.entry(key.to_owned()) {
                Entry::Occupied(_) => Err(Error::new(
                    ErrorKind::DuplicateKey(key.to_owned()),
                    key_offset,
                )),
                Entry::Vacant(slot) => {
                    slot.insert(value);
                    Ok(())
                }
            }
        })?;
        Ok(doc)
    }

    /// Arrays are documents keyed "0", "1", ...; values are kept in wire order.
    fn read_array(&mut self, cur: &mut Cursor<'a>) -> Result<Vec<Value>> {
        let strict = self.config.array_strict_indices;
        let mut arr = Vec::new();
        self.read_container(cur, |key_offset, key, value| {
            if strict {
                let expected = arr.len().to_string();
                if key != expected {
                    return Err(Error::new(
                        ErrorKind::InvalidArrayIndex {
                            expected,
                            actual: key.to_owned(),
                        },
                        key_offset,
                    ));
                }
            }
            arr.push(value);
            Ok(())
        })?;
        Ok(arr)
    }

    /// Step one level deeper, failing if that passes `max_depth`.
    fn enter(&mut self, cur: &Cursor<'a>) -> Result<()> {
        if self.depth >= self.config.max_depth {
            return Err(cur
                .error(ErrorKind::DepthExceeded)
                .with_context(format!("max_depth {}", self.config.max_depth)));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // =========================================================================
    // Element dispatcher
    // =========================================================================

    /// Read one `type key payload` record.
    /// Returns `None` at the 0x00 terminator.
    fn read_element(&mut self, cur: &mut Cursor<'a>) -> Result<Option<(usize, &'a str, Value)>> {
        if cur.is_empty() {
            return Err(cur.error(ErrorKind::MissingTerminator));
        }

        let tc = cur.peek_u8()?;
        if tc == element_type::END {
            cur.u8()?;
            return Ok(None);
        }
        if !element_type::is_known(tc) {
            return Err(cur
                .error(ErrorKind::UnknownType(tc))
                .with_context(format!("type code 0x{tc:02x}")));
        }
        cur.u8()?;

        let key_offset = cur.position();
        let key = cur.cstring()?;
        let value = self
            .read_payload(cur, tc)
            .map_err(|err| err.or_context(|| format!("key {key:?}")))?;
        Ok(Some((key_offset, key, value)))
    }

    /// Decode a payload given its type code.
    fn read_payload(&mut self, cur: &mut Cursor<'a>, tc: u8) -> Result<Value> {
        match tc {
            element_type::DOUBLE => Ok(Value::Double(cur.f64_le()?)),
            element_type::STRING => {
                if self.config.validate_utf8 {
                    Ok(Value::String(cur.length_prefixed_string()?.to_owned()))
                } else {
                    Ok(Value::RawString(cur.length_prefixed_bytes()?.to_vec()))
                }
            }
            element_type::DOCUMENT => {
                self.enter(cur)?;
                let doc = self.read_document(cur)?;
                self.leave();
                Ok(Value::Document(doc))
            }
            element_type::ARRAY => {
                self.enter(cur)?;
                let arr = self.read_array(cur)?;
                self.leave();
                Ok(Value::Array(arr))
            }
            element_type::BINARY => {
                let start = cur.position();
                let len = cur.i32_le()?;
                if len < 0 {
                    return Err(Error::new(ErrorKind::InvalidBinaryLength, start)
                        .with_context(format!("declared length {len}")));
                }
                let subtype = cur.u8()?;
                let bytes = cur.bytes(len as usize)?;
                Ok(Value::Binary { subtype, bytes })
            }
            element_type::UNDEFINED => Ok(Value::Undefined),
            element_type::OBJECT_ID => {
                Ok(Value::ObjectId(ObjectId(cur.fixed::<{ limits::OBJECT_ID_SIZE }>()?)))
            }
            element_type::BOOLEAN => match cur.peek_u8()? {
                0x00 | 0x01 => Ok(Value::Boolean(cur.u8()? == 0x01)),
                other => Err(cur
                    .error(ErrorKind::InvalidBoolean)
                    .with_context(format!("byte 0x{other:02x}"))),
            },
            element_type::DATE_TIME => Ok(Value::DateTime(cur.i64_le()?)),
            element_type::NULL => Ok(Value::Null),
            element_type::REGEX => {
                let pattern = cur.cstring()?.to_owned();
                let options = cur.cstring()?.to_owned();
                Ok(Value::Regex { pattern, options })
            }
            element_type::DB_POINTER => {
                let namespace = cur.length_prefixed_string()?.to_owned();
                let id = ObjectId(cur.fixed::<{ limits::OBJECT_ID_SIZE }>()?);
                Ok(Value::DbPointer { namespace, id })
            }
            element_type::JS_CODE => Ok(Value::JsCode(cur.length_prefixed_string()?.to_owned())),
            element_type::SYMBOL => Ok(Value::Symbol(cur.length_prefixed_string()?.to_owned())),
            element_type::JS_CODE_WITH_SCOPE => self.read_code_with_scope(cur),
            element_type::INT32 => Ok(Value::Int32(cur.i32_le()?)),
            element_type::TIMESTAMP => Ok(Value::Timestamp(Timestamp(cur.u64_le()?))),
            element_type::INT64 => Ok(Value::Int64(cur.i64_le()?)),
            element_type::DECIMAL128 => {
                Ok(Value::Decimal128(cur.fixed::<{ limits::DECIMAL128_SIZE }>()?))
            }
            element_type::MIN_KEY => Ok(Value::MinKey),
            element_type::MAX_KEY => Ok(Value::MaxKey),
            _ => Err(cur.error(ErrorKind::UnknownType(tc))),
        }
    }

    /// `int32 total, string code, document scope`, where `total` frames both.
    fn read_code_with_scope(&mut self, cur: &mut Cursor<'a>) -> Result<Value> {
        let start = cur.position();
        let total = cur.i32_le()?;
        if total < limits::MIN_CODE_WITH_SCOPE_SIZE as i32 {
            return Err(Error::new(ErrorKind::InvalidDocumentLength, start)
                .with_context(format!("code with scope declares {total} bytes")));
        }

        let mut frame = cur.subcursor(total as usize - 4)?;
        let code = frame.length_prefixed_string()?.to_owned();
        self.enter(&frame)?;
        let scope = self.read_document(&mut frame)?;
        self.leave();

        if !frame.is_empty() {
            return Err(frame.error(ErrorKind::TrailingBytes));
        }
        Ok(Value::JsCodeWithScope { code, scope })
    }
}
