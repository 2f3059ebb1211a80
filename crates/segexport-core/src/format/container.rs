//! Decoder for exported containers.
//!
//! Walks a container the same way the fuzzing harness loader does: region
//! headers, then each region's data in header order, then the symbol table.
//! Used by the `inspect` command and to verify exports in tests.

use serde::Serialize;

use crate::config::format;
use crate::error::{Error, Result};
use crate::image::Permissions;

use super::ByteBuffer;

/// One region header as stored in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionHeader {
    pub start: u64,
    pub end_exclusive: u64,
    pub permissions: u64,
}

impl RegionHeader {
    pub fn size(&self) -> u64 {
        self.end_exclusive - self.start
    }

    /// Decoded permission flags, or `None` if unknown bits are set.
    pub fn flags(&self) -> Option<Permissions> {
        Permissions::from_bits(self.permissions)
    }
}

/// A region header together with the data that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRegion<'a> {
    pub header: RegionHeader,
    pub data: &'a [u8],
}

impl ContainerRegion<'_> {
    pub fn contains(&self, address: u64) -> bool {
        (self.header.start..self.header.end_exclusive).contains(&address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerSymbol {
    pub address: u64,
    pub name: String,
}

/// A fully parsed container borrowing region data from the input bytes.
#[derive(Debug, Clone)]
pub struct Container<'a> {
    pub regions: Vec<ContainerRegion<'a>>,
    pub symbols: Vec<ContainerSymbol>,
    pub symbol_payload_size: usize,
    pub total_size: usize,
}

/// Serializable overview of a container.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerSummary {
    pub total_size: usize,
    pub region_count: usize,
    pub data_size: u64,
    pub regions: Vec<RegionSummary>,
    pub symbol_count: usize,
    pub symbol_payload_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionSummary {
    pub start: String,
    pub end: String,
    pub size: u64,
    pub permissions: String,
}

impl<'a> Container<'a> {
    /// Parse a complete container.
    ///
    /// # Errors
    ///
    /// Returns `MalformedContainer` if the input is truncated, a header has
    /// `end < start` or unknown permission bits, the symbol table does not
    /// match its declared payload size, or bytes trail the symbol table.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let mut buf = ByteBuffer::new(bytes);

        let count_at = buf.position();
        let region_count = buf.read_len()?;
        let fits = region_count
            .checked_mul(format::REGION_HEADER_SIZE)
            .is_some_and(|size| size <= buf.remaining());
        if !fits {
            return Err(Error::malformed(
                count_at,
                format!("Region count {} exceeds container size", region_count),
            ));
        }

        let mut headers = Vec::with_capacity(region_count);
        for _ in 0..region_count {
            let at = buf.position();
            let header = RegionHeader {
                start: buf.read_u64()?,
                end_exclusive: buf.read_u64()?,
                permissions: buf.read_u64()?,
            };
            if header.end_exclusive < header.start {
                return Err(Error::malformed(
                    at,
                    format!(
                        "Region end 0x{:X} precedes start 0x{:X}",
                        header.end_exclusive, header.start
                    ),
                ));
            }
            if header.flags().is_none() {
                return Err(Error::malformed(
                    at + 2 * format::WORD_SIZE,
                    format!("Unknown permission bits 0x{:X}", header.permissions),
                ));
            }
            headers.push(header);
        }

        let mut regions = Vec::with_capacity(region_count);
        for header in headers {
            let at = buf.position();
            let size = usize::try_from(header.size()).map_err(|_| {
                Error::malformed(at, format!("Region size 0x{:X} too large", header.size()))
            })?;
            let data = buf.read_bytes(size)?;
            regions.push(ContainerRegion { header, data });
        }

        let symbol_count = buf.read_len()?;
        let payload_at = buf.position();
        let symbol_payload_size = buf.read_len()?;
        let payload = buf.read_bytes(symbol_payload_size)?;

        let symbols = Self::parse_symbols(payload, symbol_count, payload_at)?;

        if buf.remaining() != 0 {
            return Err(Error::malformed(
                buf.position(),
                format!("{} trailing bytes after symbol table", buf.remaining()),
            ));
        }

        Ok(Self {
            regions,
            symbols,
            symbol_payload_size,
            total_size: bytes.len(),
        })
    }

    fn parse_symbols(payload: &[u8], count: usize, base: usize) -> Result<Vec<ContainerSymbol>> {
        let rebase = |e: Error| match e {
            Error::MalformedContainer { offset, message } => Error::MalformedContainer {
                offset: offset + base as u64 + format::WORD_SIZE as u64,
                message,
            },
            other => other,
        };

        let mut buf = ByteBuffer::new(payload);
        let mut symbols = Vec::with_capacity(count.min(payload.len() / format::SYMBOL_ENTRY_OVERHEAD));
        for _ in 0..count {
            let address = buf.read_u64().map_err(rebase)?;
            let name = buf.read_cstr().map_err(rebase)?;
            symbols.push(ContainerSymbol {
                address,
                name: name.to_string(),
            });
        }

        if buf.remaining() != 0 {
            return Err(Error::malformed(
                base,
                format!(
                    "Symbol payload declares {} bytes but {} symbols use {}",
                    payload.len(),
                    count,
                    buf.position()
                ),
            ));
        }
        Ok(symbols)
    }

    /// Address of the symbol named `name`. Later entries win, as in the loader.
    pub fn symbol_address(&self, name: &str) -> Option<u64> {
        self.symbols
            .iter()
            .rev()
            .find(|s| s.name == name)
            .map(|s| s.address)
    }

    pub fn region_containing(&self, address: u64) -> Option<&ContainerRegion<'a>> {
        self.regions.iter().find(|r| r.contains(address))
    }

    pub fn data_size(&self) -> u64 {
        self.regions.iter().map(|r| r.data.len() as u64).sum()
    }

    pub fn summary(&self) -> ContainerSummary {
        ContainerSummary {
            total_size: self.total_size,
            region_count: self.regions.len(),
            data_size: self.data_size(),
            regions: self
                .regions
                .iter()
                .map(|r| RegionSummary {
                    start: format!("0x{:X}", r.header.start),
                    end: format!("0x{:X}", r.header.end_exclusive),
                    size: r.header.size(),
                    permissions: r
                        .header
                        .flags()
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| format!("0x{:X}", r.header.permissions)),
                })
                .collect(),
            symbol_count: self.symbols.len(),
            symbol_payload_size: self.symbol_payload_size,
        }
    }
}
