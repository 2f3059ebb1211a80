//! Byte buffer utilities for parsing exported containers.
//!
//! This module provides `ByteBuffer`, a position-tracking byte reader used to
//! walk a container the way the fuzzing harness loader does.

use crate::error::{Error, Result};

/// A position-tracking byte reader for parsing binary data structures.
///
/// `ByteBuffer` wraps a byte slice and maintains a current position, allowing
/// sequential reads of little-endian integers and NUL-terminated strings.
///
/// # Example
///
/// ```
/// use segexport_core::format::ByteBuffer;
///
/// let data = [0x78, 0x56, 0x34, 0x12, 0x00, 0x00, 0x00, 0x00];
/// let mut buf = ByteBuffer::new(&data);
///
/// let value = buf.read_u64().unwrap();
/// assert_eq!(value, 0x12345678);
/// assert_eq!(buf.position(), 8);
/// ```
pub struct ByteBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Creates a new `ByteBuffer` wrapping the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of bytes remaining from the current position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Reads an unsigned 64-bit integer (little-endian) and advances the position.
    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Reads a 64-bit length field and checks that it fits in `usize`.
    pub fn read_len(&mut self) -> Result<usize> {
        let at = self.pos;
        let value = self.read_u64()?;
        usize::try_from(value)
            .map_err(|_| Error::malformed(at, format!("Length {} does not fit in memory", value)))
    }

    /// Reads the specified number of bytes and advances the position.
    ///
    /// # Errors
    ///
    /// Returns an error if there are not enough bytes remaining.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(count)
            .ok_or_else(|| Error::malformed(self.pos, "Position overflow"))?;

        if end > self.data.len() {
            return Err(Error::malformed(
                self.pos,
                format!(
                    "Read of {} bytes at position {} exceeds buffer length {}",
                    count,
                    self.pos,
                    self.data.len()
                ),
            ));
        }

        let result = &self.data[self.pos..end];
        self.pos = end;
        Ok(result)
    }

    /// Reads a NUL-terminated UTF-8 string and advances past the terminator.
    pub fn read_cstr(&mut self) -> Result<&'a str> {
        let start = self.pos;
        let rest = &self.data[start.min(self.data.len())..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::malformed(start, "Unterminated string"))?;

        let bytes = self.read_bytes(len)?;
        self.pos += 1;

        std::str::from_utf8(bytes)
            .map_err(|e| Error::malformed(start, format!("Invalid UTF-8 in string: {}", e)))
    }
}
