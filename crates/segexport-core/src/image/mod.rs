//! Image data model.
//!
//! This module contains the input side of an export:
//! - `MemoryRegion` - address span with permissions and initialization state
//! - `Symbol`, `SymbolSource` - named addresses and their provenance
//! - `Permissions` - read/write/execute flags and their 3-bit packing
//! - `ImageSource` - trait implemented by everything the exporter can read

mod permissions;
mod region;
mod source;
mod symbol;

// Mock image source for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use permissions::Permissions;
pub use region::MemoryRegion;
pub use source::ImageSource;
pub use symbol::{Symbol, SymbolSource};

#[doc(hidden)]
pub use mock::{MockImage, MockImageBuilder};
