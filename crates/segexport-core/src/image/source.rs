//! Image source abstraction.
//!
//! An image source is whatever can describe a disassembled binary: its memory
//! regions, its symbols, and the raw bytes behind each region. Abstracting it
//! lets the exporter run against manifests, ELF files, or in-memory mocks.

use crate::error::Result;

use super::{MemoryRegion, Symbol};

/// Trait for supplying regions, symbols and region bytes to the exporter.
pub trait ImageSource {
    /// Display name of the program, used in log messages.
    fn name(&self) -> &str;

    /// All memory regions, including uninitialized ones.
    fn regions(&self) -> &[MemoryRegion];

    /// All symbols in enumeration order, including default-generated ones.
    fn symbols(&self) -> &[Symbol];

    /// Read the full contents of `region`.
    ///
    /// Implementations must return exactly `region.size()` bytes or an error.
    fn read_region(&self, region: &MemoryRegion) -> Result<Vec<u8>>;
}

impl<S: ImageSource + ?Sized> ImageSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn regions(&self) -> &[MemoryRegion] {
        (**self).regions()
    }

    fn symbols(&self) -> &[Symbol] {
        (**self).symbols()
    }

    fn read_region(&self, region: &MemoryRegion) -> Result<Vec<u8>> {
        (**self).read_region(region)
    }
}
