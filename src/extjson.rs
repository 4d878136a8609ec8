// ABOUTME: serde::Serialize for decoded values, rendered as relaxed MongoDB Extended JSON v2.
// ABOUTME: Also renders decimal128 wire bytes as their canonical decimal string.

use crate::value::{Document, Value};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Serialize)]
struct Oid {
    #[serde(rename = "$oid")]
    oid: String,
}

#[derive(Serialize)]
struct BinaryBody {
    base64: String,
    #[serde(rename = "subType")]
    sub_type: String,
}

#[derive(Serialize)]
struct RegexBody<'a> {
    pattern: &'a str,
    options: &'a str,
}

#[derive(Serialize)]
struct DbPointerBody<'a> {
    #[serde(rename = "$ref")]
    namespace: &'a str,
    #[serde(rename = "$id")]
    id: Oid,
}

#[derive(Serialize)]
struct TimestampBody {
    t: u32,
    i: u32,
}

#[derive(Serialize)]
struct NumberLong {
    #[serde(rename = "$numberLong")]
    value: String,
}

#[derive(Serialize)]
struct CodeWithScope<'a> {
    #[serde(rename = "$code")]
    code: &'a str,
    #[serde(rename = "$scope")]
    scope: &'a Document,
}

/// A single-entry `{"$tag": value}` wrapper.
fn tagged<S: Serializer, T: Serialize + ?Sized>(
    serializer: S,
    tag: &'static str,
    value: &T,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(tag, value)?;
    map.end()
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Document(doc) => doc.serialize(serializer),
            Value::Array(arr) => arr.serialize(serializer),
            Value::Double(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Double(f) => {
                let text = if f.is_nan() {
                    "NaN"
                } else if f.is_sign_positive() {
                    "Infinity"
                } else {
                    "-Infinity"
                };
                tagged(serializer, "$numberDouble", text)
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::RawString(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
            Value::Binary { subtype, bytes } => tagged(
                serializer,
                "$binary",
                &BinaryBody {
                    base64: STANDARD.encode(bytes),
                    sub_type: format!("{subtype:02x}"),
                },
            ),
            Value::Undefined => tagged(serializer, "$undefined", &true),
            Value::ObjectId(oid) => Oid { oid: oid.to_hex() }.serialize(serializer),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::DateTime(ms) => match relaxed_date(*ms) {
                Some(iso) => tagged(serializer, "$date", &iso),
                None => tagged(
                    serializer,
                    "$date",
                    &NumberLong {
                        value: ms.to_string(),
                    },
                ),
            },
            Value::Null => serializer.serialize_unit(),
            Value::Regex { pattern, options } => tagged(
                serializer,
                "$regularExpression",
                &RegexBody { pattern, options },
            ),
            Value::DbPointer { namespace, id } => tagged(
                serializer,
                "$dbPointer",
                &DbPointerBody {
                    namespace,
                    id: Oid { oid: id.to_hex() },
                },
            ),
            Value::JsCode(code) => tagged(serializer, "$code", code),
            Value::Symbol(s) => tagged(serializer, "$symbol", s),
            Value::JsCodeWithScope { code, scope } => {
                CodeWithScope { code, scope }.serialize(serializer)
            }
            Value::Int32(n) => serializer.serialize_i32(*n),
            Value::Timestamp(ts) => tagged(
                serializer,
                "$timestamp",
                &TimestampBody {
                    t: ts.time(),
                    i: ts.increment(),
                },
            ),
            Value::Int64(n) => serializer.serialize_i64(*n),
            Value::Decimal128(bytes) => {
                tagged(serializer, "$numberDecimal", &decimal128_to_string(bytes))
            }
            Value::MinKey => tagged(serializer, "$minKey", &1),
            Value::MaxKey => tagged(serializer, "$maxKey", &1),
        }
    }
}

/// ISO-8601 form of a UTC datetime, for years 1970 through 9999 only.
fn relaxed_date(ms: i64) -> Option<String> {
    let date = DateTime::<Utc>::from_timestamp_millis(ms)?;
    (1970..=9999)
        .contains(&date.year())
        .then(|| date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

const DECIMAL128_EXPONENT_BIAS: i32 = 6176;
const DECIMAL128_MAX_COEFFICIENT: u128 = 9_999_999_999_999_999_999_999_999_999_999_999;

/// Render IEEE 754-2008 decimal128 (binary integer decimal) wire bytes as a string.
///
/// Out-of-range coefficients are non-canonical and read as zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_possible_wrap)]
pub fn decimal128_to_string(bytes: &[u8; 16]) -> String {
    let mut low = [0u8; 8];
    let mut high = [0u8; 8];
    low.copy_from_slice(&bytes[..8]);
    high.copy_from_slice(&bytes[8..]);
    let low = u64::from_le_bytes(low);
    let high = u64::from_le_bytes(high);

    let sign = if high >> 63 == 1 { "-" } else { "" };
    let combination = (high >> 58) & 0x1f;

    let (biased_exponent, coefficient) = if combination >> 3 == 0b11 {
        match combination {
            0x1e => return format!("{sign}Infinity"),
            0x1f => return "NaN".to_owned(),
            // Implicit 0b100 prefix always exceeds the maximum coefficient.
            _ => ((high >> 47) & 0x3fff, 0u128),
        }
    } else {
        let coefficient = (u128::from(high & 0x1_ffff_ffff_ffff) << 64) | u128::from(low);
        (
            (high >> 49) & 0x3fff,
            if coefficient > DECIMAL128_MAX_COEFFICIENT {
                0
            } else {
                coefficient
            },
        )
    };

    let exponent = biased_exponent as i32 - DECIMAL128_EXPONENT_BIAS;
    let digits = coefficient.to_string();
    let adjusted = exponent + digits.len() as i32 - 1;

    if exponent <= 0 && adjusted >= -6 {
        if exponent == 0 {
            return format!("{sign}{digits}");
        }
        let point = digits.len() as i32 + exponent;
        if point > 0 {
            let (int_part, frac_part) = digits.split_at(point as usize);
            format!("{sign}{int_part}.{frac_part}")
        } else {
            let zeros = "0".repeat((-point) as usize);
            format!("{sign}0.{zeros}{digits}")
        }
    } else {
        let (first, rest) = digits.split_at(1);
        let dot = if rest.is_empty() { "" } else { "." };
        let exp_sign = if adjusted >= 0 { "+" } else { "" };
        format!("{sign}{first}{dot}{rest}E{exp_sign}{adjusted}")
    }
}
