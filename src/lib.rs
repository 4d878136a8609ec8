// ABOUTME: Strict BSON (Binary JSON) decoder for Rust.
// ABOUTME: Decodes one top-level document into an ordered value tree, with serde integration.

//! # bsonkit
//!
//! A strict, bounds-checked decoder for the [BSON](https://bsonspec.org) wire format.
//!
//! Given a buffer holding exactly one top-level document, the decoder produces
//! a [`Value`] tree (documents keep their wire order) or an [`Error`] naming
//! what went wrong and the byte offset where it was detected.
//!
//! ## Quick Start
//!
//! ```rust
//! use bsonkit::{decode, Value};
//!
//! // {"hi": "world"}
//! let bytes = [
//!     0x13, 0x00, 0x00, 0x00,
//!     0x02, b'h', b'i', 0x00,
//!     0x06, 0x00, 0x00, 0x00, b'w', b'o', b'r', b'l', b'd', 0x00,
//!     0x00,
//! ];
//! let value = decode(&bytes).unwrap();
//! assert_eq!(value.get_key("hi").and_then(|v| v.as_str()), Some("world"));
//! ```
//!
//! ## Deserializing into Rust types
//!
//! ```rust
//! use bsonkit::from_slice;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Answer {
//!     i: i32,
//! }
//!
//! let bytes = [0x0c, 0, 0, 0, 0x10, b'i', 0, 0x2a, 0, 0, 0, 0];
//! let answer: Answer = from_slice(&bytes).unwrap();
//! assert_eq!(answer.i, 42);
//! ```
//!
//! ## Validation
//!
//! Every length-framed region (documents, arrays, code-with-scope) is read
//! through its own bounded cursor, so an inner frame can never read past its
//! declared length. Decoding rejects:
//! - declared lengths that disagree with the bytes actually present
//! - missing terminators, unterminated or non-UTF-8 strings and keys
//! - boolean bytes other than 0x00/0x01 and unknown element types
//! - duplicate keys within a document
//! - nesting deeper than [`DecoderConfig::max_depth`] (default 100)

pub mod cursor;
pub mod de;
pub mod decoder;
pub mod error;
pub mod extjson;
pub mod types;
pub mod value;

// Re-export commonly used items at the crate root
pub use cursor::Cursor;
pub use de::{from_slice, from_slice_with_config, from_value};
pub use decoder::{Decoder, DecoderConfig};
pub use error::{Error, ErrorKind, Result};
pub use types::{element_type, limits, BinarySubtype, ObjectId, Timestamp};
pub use value::{Document, Value};

// The bson! macro is automatically exported at crate root via #[macro_export]

/// Decode a complete top-level BSON document.
///
/// Returns `Value::Document`.
///
/// # Errors
///
/// Returns the first fault found; no partial tree is ever returned.
pub fn decode(data: &[u8]) -> Result<Value> {
    decode_with_options(data, DecoderConfig::default())
}

/// Decode a complete top-level BSON document with custom configuration.
///
/// # Errors
///
/// Returns the first fault found under `config`.
pub fn decode_with_options(data: &[u8], config: DecoderConfig) -> Result<Value> {
    decode_document_with_options(data, config).map(Value::Document)
}

/// Decode a complete top-level BSON document, returning the bare mapping.
///
/// # Errors
///
/// Returns the first fault found.
pub fn decode_document(data: &[u8]) -> Result<Document> {
    decode_document_with_options(data, DecoderConfig::default())
}

/// Decode a complete top-level BSON document with custom configuration,
/// returning the bare mapping.
///
/// # Errors
///
/// Returns the first fault found under `config`.
pub fn decode_document_with_options(data: &[u8], config: DecoderConfig) -> Result<Document> {
    Decoder::with_config(data, config).decode_document()
}
