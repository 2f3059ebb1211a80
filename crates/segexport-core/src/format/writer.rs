//! Growable little-endian output buffer.

use crate::config::format;
use crate::error::{Error, Result};

/// An append-only byte buffer that emits fixed-width little-endian integers.
///
/// All container sections are appended to one `ByteWriter`; nothing is
/// written to a sink until the buffer is complete.
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    data: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with room for `capacity` bytes.
    ///
    /// An oversized or failed allocation is reported as `BufferAllocation`
    /// instead of aborting the process.
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|e| Error::BufferAllocation(format!("{} bytes: {}", capacity, e)))?;
        Ok(Self { data })
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends an unsigned 64-bit integer (little-endian).
    pub fn write_u64(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a `usize` as an unsigned 64-bit integer (little-endian).
    pub fn write_len(&mut self, value: usize) {
        self.write_u64(value as u64);
    }

    /// Appends raw bytes verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Appends `count` zero bytes.
    pub fn write_zeros(&mut self, count: usize) {
        self.data.resize(self.data.len() + count, 0);
    }

    /// Appends a string's UTF-8 bytes followed by a NUL terminator.
    pub fn write_cstr(&mut self, text: &str) {
        self.data.extend_from_slice(text.as_bytes());
        self.data.push(0);
    }

    /// Appends one symbol-table entry: address word, name, NUL.
    ///
    /// Returns the number of bytes written.
    pub fn write_symbol_entry(&mut self, address: u64, name: &str) -> usize {
        let before = self.data.len();
        self.write_u64(address);
        self.write_cstr(name);
        debug_assert_eq!(
            self.data.len() - before,
            format::SYMBOL_ENTRY_OVERHEAD + name.len()
        );
        self.data.len() - before
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
