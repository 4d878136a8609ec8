// ABOUTME: Defines BSON element type codes, binary subtypes, and small wire-level value types.
// ABOUTME: Type codes map directly to the BSON 1.1 wire byte values.

use std::fmt;

/// Element type codes for BSON values.
/// These match the BSON 1.1 wire values exactly.
pub mod element_type {
    /// Marks the end of a document or array.
    pub const END: u8 = 0x00;

    pub const DOUBLE: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const DOCUMENT: u8 = 0x03;
    pub const ARRAY: u8 = 0x04;
    pub const BINARY: u8 = 0x05;
    /// Deprecated.
    pub const UNDEFINED: u8 = 0x06;
    pub const OBJECT_ID: u8 = 0x07;
    pub const BOOLEAN: u8 = 0x08;
    pub const DATE_TIME: u8 = 0x09;
    pub const NULL: u8 = 0x0a;
    pub const REGEX: u8 = 0x0b;
    /// Deprecated.
    pub const DB_POINTER: u8 = 0x0c;
    pub const JS_CODE: u8 = 0x0d;
    /// Deprecated.
    pub const SYMBOL: u8 = 0x0e;
    /// Deprecated.
    pub const JS_CODE_WITH_SCOPE: u8 = 0x0f;
    pub const INT32: u8 = 0x10;
    pub const TIMESTAMP: u8 = 0x11;
    pub const INT64: u8 = 0x12;
    pub const DECIMAL128: u8 = 0x13;
    pub const MIN_KEY: u8 = 0xff;
    pub const MAX_KEY: u8 = 0x7f;

    /// Check if a type code names an element the decoder understands.
    #[inline]
    pub const fn is_known(code: u8) -> bool {
        matches!(code, DOUBLE..=DECIMAL128 | MIN_KEY | MAX_KEY)
    }
}

/// Classification of a binary element's subtype byte.
///
/// The decoder always preserves the raw byte; this enum only names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinarySubtype {
    Generic,
    Function,
    /// Old binary format; the payload still carries its own inner length prefix.
    BinaryOld,
    UuidOld,
    Uuid,
    Md5,
    Encrypted,
    Column,
    Sensitive,
    Vector,
    /// Reserved for future MongoDB use (0x0a-0x7f).
    Reserved(u8),
    /// User-defined (0x80-0xff).
    UserDefined(u8),
}

impl From<u8> for BinarySubtype {
    fn from(byte: u8) -> Self {
        match byte {
            0x00 => BinarySubtype::Generic,
            0x01 => BinarySubtype::Function,
            0x02 => BinarySubtype::BinaryOld,
            0x03 => BinarySubtype::UuidOld,
            0x04 => BinarySubtype::Uuid,
            0x05 => BinarySubtype::Md5,
            0x06 => BinarySubtype::Encrypted,
            0x07 => BinarySubtype::Column,
            0x08 => BinarySubtype::Sensitive,
            0x09 => BinarySubtype::Vector,
            0x80..=0xff => BinarySubtype::UserDefined(byte),
            _ => BinarySubtype::Reserved(byte),
        }
    }
}

impl From<BinarySubtype> for u8 {
    fn from(subtype: BinarySubtype) -> Self {
        match subtype {
            BinarySubtype::Generic => 0x00,
            BinarySubtype::Function => 0x01,
            BinarySubtype::BinaryOld => 0x02,
            BinarySubtype::UuidOld => 0x03,
            BinarySubtype::Uuid => 0x04,
            BinarySubtype::Md5 => 0x05,
            BinarySubtype::Encrypted => 0x06,
            BinarySubtype::Column => 0x07,
            BinarySubtype::Sensitive => 0x08,
            BinarySubtype::Vector => 0x09,
            BinarySubtype::Reserved(b) | BinarySubtype::UserDefined(b) => b,
        }
    }
}

/// An opaque 12-byte MongoDB identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub [u8; 12]);

impl ObjectId {
    #[inline]
    #[must_use]
    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Seconds since the Unix epoch stored in the big-endian leading four bytes.
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Lowercase hexadecimal form, 24 characters.
    #[must_use]
    pub fn to_hex(&self) -> String {
        use fmt::Write;
        let mut out = String::with_capacity(24);
        for byte in self.0 {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

/// A replication timestamp, kept as the single 64-bit wire value.
///
/// The low 32 bits are an increment, the high 32 bits are seconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(pub u64);

impl Timestamp {
    #[inline]
    #[must_use]
    pub const fn new(time: u32, increment: u32) -> Self {
        Self(((time as u64) << 32) | increment as u64)
    }

    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn time(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn increment(&self) -> u32 {
        self.0 as u32
    }
}

/// Default resource limits.
pub mod limits {
    /// Maximum container nesting depth below the root document.
    pub const MAX_DEPTH: u32 = 100;

    /// Smallest legal document: the length prefix plus the terminator.
    pub const MIN_DOCUMENT_SIZE: usize = 5;

    /// Smallest legal code-with-scope frame: total length, empty string, empty document.
    pub const MIN_CODE_WITH_SCOPE_SIZE: usize = 4 + 5 + MIN_DOCUMENT_SIZE;

    pub const OBJECT_ID_SIZE: usize = 12;

    pub const DECIMAL128_SIZE: usize = 16;
}
