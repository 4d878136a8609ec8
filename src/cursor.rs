// ABOUTME: Bounded little-endian read head over a BSON byte buffer.
// ABOUTME: Subcursors carve length-framed regions so a container can never read past its frame.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_sign_loss)]

use crate::error::{Error, ErrorKind, Result};

/// Validate and convert bytes to a UTF-8 string.
/// Uses simdutf8 for SIMD-accelerated validation when the feature is enabled.
#[cfg(feature = "simd-utf8")]
#[inline]
pub(crate) fn validate_utf8(bytes: &[u8]) -> std::result::Result<&str, ()> {
    simdutf8::basic::from_utf8(bytes).map_err(|_| ())
}

#[cfg(not(feature = "simd-utf8"))]
#[inline]
pub(crate) fn validate_utf8(bytes: &[u8]) -> std::result::Result<&str, ()> {
    std::str::from_utf8(bytes).map_err(|_| ())
}

/// A bounded read head.
///
/// Every read either succeeds and advances, or fails and leaves the position
/// untouched. Offsets reported in errors are absolute, so a subcursor carved
/// deep inside a document still points at the right byte of the original input.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    /// Absolute offset of `data[0]` in the top-level input.
    base: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor spanning the whole buffer.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Absolute offset of the next byte to be read.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    /// Bytes left in this cursor's frame.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Build an error located at the current position.
    #[inline]
    pub(crate) fn error(&self, kind: ErrorKind) -> Error {
        Error::new(kind, self.position())
    }

    /// Build an error located `delta` bytes past the current position.
    #[inline]
    fn error_at(&self, delta: usize, kind: ErrorKind) -> Error {
        Error::new(kind, self.position() + delta)
    }

    #[inline]
    fn ensure(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(self.error(ErrorKind::InsufficientData));
        }
        Ok(())
    }

    /// Borrow the next `n` bytes and advance past them.
    #[inline]
    pub(crate) fn slice(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    #[inline]
    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.slice(N)?);
        Ok(buf)
    }

    /// Read one byte without advancing.
    #[inline]
    pub fn peek_u8(&self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.data[self.pos])
    }

    #[inline]
    pub fn u8(&mut self) -> Result<u8> {
        let byte = self.peek_u8()?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    pub fn i32_le(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    #[inline]
    pub fn i64_le(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    #[inline]
    pub fn u64_le(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    #[inline]
    pub fn f64_le(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    /// Copy out the next `n` bytes.
    #[inline]
    pub fn bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.slice(n)?.to_vec())
    }

    /// Copy out a fixed-size run, e.g. an ObjectId.
    #[inline]
    pub fn fixed<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.array()
    }

    /// Read a NUL-terminated UTF-8 string, consuming the NUL.
    pub fn cstring(&mut self) -> Result<&'a str> {
        let rest = &self.data[self.pos..];
        let Some(len) = memchr::memchr(0, rest) else {
            return Err(self.error(ErrorKind::UnterminatedCString));
        };
        let s = validate_utf8(&rest[..len]).map_err(|()| self.error(ErrorKind::InvalidUtf8))?;
        self.pos += len + 1;
        Ok(s)
    }

    /// Read an i32 length `L` (which counts the trailing NUL) followed by `L`
    /// bytes, returning the bytes before the NUL without UTF-8 validation.
    pub fn length_prefixed_bytes(&mut self) -> Result<&'a [u8]> {
        let start = self.pos;
        let declared = self.i32_le()?;
        if declared < 1 {
            self.pos = start;
            return Err(self.error(ErrorKind::InvalidStringLength));
        }
        let len = declared as usize;
        let body = match self.slice(len) {
            Ok(body) => body,
            Err(err) => {
                self.pos = start;
                return Err(err);
            }
        };
        if body[len - 1] != 0 {
            self.pos = start;
            return Err(self.error_at(4 + len - 1, ErrorKind::UnterminatedString));
        }
        Ok(&body[..len - 1])
    }

    /// Read a length-prefixed string and validate it as UTF-8.
    pub fn length_prefixed_string(&mut self) -> Result<&'a str> {
        let start = self.pos;
        let bytes = self.length_prefixed_bytes()?;
        validate_utf8(bytes).map_err(|()| {
            self.pos = start;
            self.error_at(4, ErrorKind::InvalidUtf8)
        })
    }

    /// Carve a bounded view of the next `n` bytes and advance this cursor past them.
    pub fn subcursor(&mut self, n: usize) -> Result<Cursor<'a>> {
        let base = self.position();
        let data = self.slice(n)?;
        Ok(Cursor { data, pos: 0, base })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_reads() {
        let mut data = Vec::new();
        data.push(0xab);
        data.extend_from_slice(&(-2i32).to_le_bytes());
        data.extend_from_slice(&(-3i64).to_le_bytes());
        data.extend_from_slice(&u64::MAX.to_le_bytes());
        data.extend_from_slice(&1.5f64.to_le_bytes());

        let mut cur = Cursor::new(&data);
        assert_eq!(cur.peek_u8().unwrap(), 0xab);
        assert_eq!(cur.u8().unwrap(), 0xab);
        assert_eq!(cur.i32_le().unwrap(), -2);
        assert_eq!(cur.i64_le().unwrap(), -3);
        assert_eq!(cur.u64_le().unwrap(), u64::MAX);
        assert_eq!(cur.f64_le().unwrap(), 1.5);
        assert!(cur.is_empty());
        assert_eq!(cur.position(), data.len());
    }

    #[test]
    fn test_short_read_does_not_advance() {
        let mut cur = Cursor::new(&[0x01, 0x02, 0x03]);
        cur.u8().unwrap();
        let err = cur.i32_le().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InsufficientData);
        assert_eq!(err.offset(), 1);
        assert_eq!(cur.position(), 1);
        assert_eq!(cur.bytes(2).unwrap(), vec![0x02, 0x03]);
    }

    #[test]
    fn test_cstring() {
        let mut cur = Cursor::new(b"abc\0\0rest");
        assert_eq!(cur.cstring().unwrap(), "abc");
        assert_eq!(cur.cstring().unwrap(), "");
        assert_eq!(cur.position(), 5);

        let err = cur.cstring().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnterminatedCString);
        assert_eq!(err.offset(), 5);
        assert_eq!(cur.position(), 5);
    }

    #[test]
    fn test_cstring_invalid_utf8() {
        let mut cur = Cursor::new(&[0xff, 0xfe, 0x00]);
        let err = cur.cstring().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidUtf8);
        assert_eq!(cur.position(), 0);
    }

    #[test]
    fn test_length_prefixed_string() {
        let mut cur = Cursor::new(&[0x06, 0, 0, 0, b'w', b'o', b'r', b'l', b'd', 0]);
        assert_eq!(cur.length_prefixed_string().unwrap(), "world");
        assert!(cur.is_empty());

        // Minimal string: length 1, just the NUL.
        let mut cur = Cursor::new(&[0x01, 0, 0, 0, 0]);
        assert_eq!(cur.length_prefixed_string().unwrap(), "");
    }

    #[test]
    fn test_length_prefixed_string_faults() {
        let mut cur = Cursor::new(&[0x00, 0, 0, 0, 0]);
        let err = cur.length_prefixed_string().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidStringLength);
        assert_eq!(cur.position(), 0);

        let mut cur = Cursor::new(&[0xff, 0xff, 0xff, 0xff, 0]);
        let err = cur.length_prefixed_string().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidStringLength);

        let mut cur = Cursor::new(&[0x03, 0, 0, 0, b'a', b'b', b'c']);
        let err = cur.length_prefixed_string().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnterminatedString);
        assert_eq!(err.offset(), 6);
        assert_eq!(cur.position(), 0);

        let mut cur = Cursor::new(&[0x09, 0, 0, 0, b'a', 0]);
        let err = cur.length_prefixed_string().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InsufficientData);
        assert_eq!(cur.position(), 0);

        let mut cur = Cursor::new(&[0x02, 0, 0, 0, 0xc3, 0]);
        let err = cur.length_prefixed_string().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidUtf8);
        assert_eq!(err.offset(), 4);
    }

    #[test]
    fn test_raw_bytes_skip_validation() {
        let mut cur = Cursor::new(&[0x03, 0, 0, 0, 0xff, 0xfe, 0]);
        assert_eq!(cur.length_prefixed_bytes().unwrap(), &[0xff, 0xfe]);
    }

    #[test]
    fn test_subcursor_bounds() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut cur = Cursor::new(&data);
        cur.u8().unwrap();
        let mut sub = cur.subcursor(3).unwrap();
        assert_eq!(cur.position(), 4);
        assert_eq!(sub.position(), 1);
        assert_eq!(sub.remaining(), 3);
        assert_eq!(sub.bytes(3).unwrap(), vec![2, 3, 4]);

        let err = sub.u8().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InsufficientData);
        assert_eq!(err.offset(), 4);

        assert!(cur.subcursor(3).is_err());
        assert_eq!(cur.position(), 4);
    }
}
