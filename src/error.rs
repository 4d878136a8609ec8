// ABOUTME: Error types for BSON decoding.
// ABOUTME: Every fault carries its kind, the absolute byte offset where it was detected, and optional context.

use std::fmt;
use thiserror::Error;

/// The result type for BSON operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of fault that aborted decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// A primitive read would run past the end of the buffer or frame.
    #[error("insufficient data")]
    InsufficientData,

    /// A document declared a total length below 5, or a code-with-scope
    /// frame is too short to hold its string and scope.
    #[error("invalid document length")]
    InvalidDocumentLength,

    /// A container ran out of bytes before its 0x00 terminator.
    #[error("missing document terminator")]
    MissingTerminator,

    /// Bytes remain after a container or the top-level document closed.
    #[error("trailing bytes after document")]
    TrailingBytes,

    /// A C-string had no NUL before the end of its frame.
    #[error("unterminated C-string")]
    UnterminatedCString,

    /// A string or key was not valid UTF-8.
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,

    /// A length-prefixed string declared a length below 1.
    #[error("invalid string length")]
    InvalidStringLength,

    /// A length-prefixed string's final byte was not 0x00.
    #[error("unterminated string")]
    UnterminatedString,

    /// A binary element declared a negative length.
    #[error("invalid binary length")]
    InvalidBinaryLength,

    /// A boolean payload byte was neither 0x00 nor 0x01.
    #[error("invalid boolean")]
    InvalidBoolean,

    /// An element carried an unrecognized type code.
    #[error("unknown element type: 0x{0:02x}")]
    UnknownType(u8),

    /// A document contained the same key twice.
    #[error("duplicate key {0:?}")]
    DuplicateKey(String),

    /// Container nesting went past the configured maximum.
    #[error("maximum nesting depth exceeded")]
    DepthExceeded,

    /// An array key did not match its position (strict index mode only).
    #[error("invalid array index: expected {expected:?}, found {actual:?}")]
    InvalidArrayIndex { expected: String, actual: String },

    /// Custom message raised through serde.
    #[error("{0}")]
    Custom(String),
}

impl ErrorKind {
    /// Returns the standardized error type name for test matching.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            ErrorKind::InsufficientData => "insufficient_data",
            ErrorKind::InvalidDocumentLength => "invalid_document_length",
            ErrorKind::MissingTerminator => "missing_terminator",
            ErrorKind::TrailingBytes => "trailing_bytes",
            ErrorKind::UnterminatedCString => "unterminated_cstring",
            ErrorKind::InvalidUtf8 => "invalid_utf8",
            ErrorKind::InvalidStringLength => "invalid_string_length",
            ErrorKind::UnterminatedString => "unterminated_string",
            ErrorKind::InvalidBinaryLength => "invalid_binary_length",
            ErrorKind::InvalidBoolean => "invalid_boolean",
            ErrorKind::UnknownType(_) => "unknown_type",
            ErrorKind::DuplicateKey(_) => "duplicate_key",
            ErrorKind::DepthExceeded => "depth_exceeded",
            ErrorKind::InvalidArrayIndex { .. } => "invalid_array_index",
            ErrorKind::Custom(_) => "custom",
        }
    }
}

/// A decoding fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    offset: usize,
    context: Option<String>,
}

impl Error {
    #[must_use]
    pub fn new(kind: ErrorKind, offset: usize) -> Self {
        Self {
            kind,
            offset,
            context: None,
        }
    }

    /// Attach a human-readable hint, such as the key being decoded.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attach context only when an inner frame has not already done so.
    pub(crate) fn or_context(mut self, context: impl FnOnce() -> String) -> Self {
        if self.context.is_none() {
            self.context = Some(context());
        }
        self
    }

    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Absolute offset into the top-level input where the fault was detected.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Shorthand for `self.kind().error_type()`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        self.kind.error_type()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)?;
        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind, 0)
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::new(ErrorKind::Custom(msg.to_string()), 0)
    }
}
