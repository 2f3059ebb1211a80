//! Container byte layout.
//!
//! All integers are unsigned 64-bit little-endian:
//!
//! ```text
//! u64 region_count
//! region_count x { u64 start, u64 end_exclusive, u64 permissions }
//! region data, in header order
//! u64 symbol_count
//! u64 symbol_payload_size
//! symbol_count x { u64 address, name bytes, 0x00 }
//! ```

mod container;
mod reader;
mod writer;

pub use container::{
    Container, ContainerRegion, ContainerSummary, ContainerSymbol, RegionHeader, RegionSummary,
};
pub use reader::ByteBuffer;
pub use writer::ByteWriter;
