//! Export configuration and container layout constants.
//!
//! This module contains:
//! - `format` - fixed sizes of the container layout
//! - `ExportOptions` - per-export settings
//! - `ReadFailurePolicy` - what to emit when a region cannot be read

mod options;

pub use options::*;

/// Fixed sizes of the container layout.
///
/// Every integer in the container is an unsigned 64-bit little-endian word.
pub mod format {
    /// Size of one integer field.
    pub const WORD_SIZE: usize = 8;

    /// Size of the leading region count.
    pub const REGION_COUNT_SIZE: usize = WORD_SIZE;

    /// One region header: start, exclusive end, permissions.
    pub const REGION_HEADER_SIZE: usize = WORD_SIZE * 3;

    /// Symbol count followed by total payload length.
    pub const SYMBOL_TABLE_PREAMBLE_SIZE: usize = WORD_SIZE * 2;

    /// Address word plus the NUL terminator of a symbol entry.
    pub const SYMBOL_ENTRY_OVERHEAD: usize = WORD_SIZE + 1;

    /// Size of a container with no regions and no symbols.
    pub const EMPTY_CONTAINER_SIZE: usize = REGION_COUNT_SIZE + SYMBOL_TABLE_PREAMBLE_SIZE;
}
