//! Flat buffer codec for the request/reply exchange with GameMaker.
//!
//! The GML side allocates one buffer, writes the request into it, and passes
//! its address across the C boundary. The FFI layer turns that pointer into a
//! slice exactly once; everything here is bounds-checked safe code.
//!
//! Wire layout:
//! - string: UTF-8 bytes followed by a NUL terminator
//! - bool:   1 byte, 0 or 1
//! - int:    8-byte little-endian two's complement (`buffer_s64` in GML)
//! - float:  8-byte little-endian IEEE-754 (`buffer_f64` in GML)

use crate::errors::{BridgeError, Result};

/// Sequential reader over a caller-owned byte region.
pub struct BufferReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BufferReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Read the next null-terminated UTF-8 string. The terminator is
    /// consumed but not part of the returned slice.
    pub fn read_str(&mut self) -> Result<&'a str> {
        let rest = &self.data[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(BridgeError::MissingTerminator { position: self.pos })?;

        let s = std::str::from_utf8(&rest[..nul])
            .map_err(|_| BridgeError::InvalidUtf8 { position: self.pos })?;

        self.pos += nul + 1;
        Ok(s)
    }
}

/// Sequential writer into a caller-owned byte region. Overflow is an error,
/// never a panic: the caller decides the capacity, we report when a reply
/// does not fit.
pub struct BufferWriter<'a> {
    data: &'a mut [u8],
    pos: usize,
}

impl<'a> BufferWriter<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn written(&self) -> usize {
        self.pos
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.remaining() {
            return Err(BridgeError::BufferTooSmall {
                needed: self.pos + bytes.len(),
                capacity: self.data.len(),
            });
        }
        self.data[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Write the string bytes plus a NUL terminator.
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        if s.len() + 1 > self.remaining() {
            return Err(BridgeError::BufferTooSmall {
                needed: self.pos + s.len() + 1,
                capacity: self.data.len(),
            });
        }
        self.put(s.as_bytes())?;
        self.put(&[0])
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.put(&[v])
    }

    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        self.put(&v.to_le_bytes())
    }

    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        self.put(&v.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_sequence_of_strings() {
        let data = b"demo\0sum\0[1, 2]\0";
        let mut reader = BufferReader::new(data);

        assert_eq!(reader.read_str().unwrap(), "demo");
        assert_eq!(reader.read_str().unwrap(), "sum");
        assert_eq!(reader.read_str().unwrap(), "[1, 2]");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_read_empty_string() {
        let data = b"\0tail\0";
        let mut reader = BufferReader::new(data);
        assert_eq!(reader.read_str().unwrap(), "");
        assert_eq!(reader.read_str().unwrap(), "tail");
    }

    #[test]
    fn test_missing_terminator() {
        let mut reader = BufferReader::new(b"abc");
        assert_eq!(
            reader.read_str().unwrap_err(),
            BridgeError::MissingTerminator { position: 0 }
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let mut reader = BufferReader::new(&[b'a', 0xff, 0xfe, 0]);
        assert!(matches!(
            reader.read_str().unwrap_err(),
            BridgeError::InvalidUtf8 { .. }
        ));
    }

    #[test]
    fn test_write_fixed_width_little_endian() {
        let mut buf = [0u8; 17];
        let mut writer = BufferWriter::new(&mut buf);

        writer.write_u8(1).unwrap();
        writer.write_i64(-2).unwrap();
        writer.write_f64(1.5).unwrap();
        assert_eq!(writer.written(), 17);

        assert_eq!(buf[0], 1);
        assert_eq!(buf[1..9], (-2i64).to_le_bytes());
        assert_eq!(buf[9..17], 1.5f64.to_le_bytes());
    }

    #[test]
    fn test_write_str_round_trip() {
        let mut buf = [0u8; 32];
        let mut writer = BufferWriter::new(&mut buf);
        writer.write_str("héllo").unwrap();
        let written = writer.written();

        let mut reader = BufferReader::new(&buf[..written]);
        assert_eq!(reader.read_str().unwrap(), "héllo");
    }

    #[test]
    fn test_write_overflow_is_error() {
        let mut buf = [0u8; 4];
        let mut writer = BufferWriter::new(&mut buf);

        // "abcd" needs 5 bytes with the terminator
        assert_eq!(
            writer.write_str("abcd").unwrap_err(),
            BridgeError::BufferTooSmall { needed: 5, capacity: 4 }
        );
        // a failed write leaves the position untouched
        assert_eq!(writer.written(), 0);
        assert!(writer.write_str("abc").is_ok());
    }

    #[test]
    fn test_write_i64_overflow() {
        let mut buf = [0u8; 7];
        let mut writer = BufferWriter::new(&mut buf);
        assert!(matches!(
            writer.write_i64(42).unwrap_err(),
            BridgeError::BufferTooSmall { needed: 8, capacity: 7 }
        ));
    }
}
