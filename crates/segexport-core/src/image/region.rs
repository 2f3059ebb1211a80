use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Permissions;

/// A contiguous span of the analyzed image with uniform permissions.
///
/// `end` is the address of the last byte (inclusive), matching how analysis
/// hosts describe memory blocks. The container stores `end + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub name: String,
    pub start: u64,
    pub end: u64,
    pub permissions: Permissions,
    pub initialized: bool,
}

impl MemoryRegion {
    /// Create an initialized region covering `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAddress` if `end < start`, or if `end` is the last
    /// representable address (the exclusive end would not fit in 64 bits).
    pub fn new(
        name: impl Into<String>,
        start: u64,
        end: u64,
        permissions: Permissions,
    ) -> Result<Self> {
        let name = name.into();
        if end < start {
            return Err(Error::InvalidAddress(format!(
                "region {} ends at 0x{:X} before its start 0x{:X}",
                name, end, start
            )));
        }
        if end == u64::MAX {
            return Err(Error::InvalidAddress(format!(
                "region {} extends to the top of the address space",
                name
            )));
        }
        Ok(Self {
            name,
            start,
            end,
            permissions,
            initialized: true,
        })
    }

    /// Create an initialized region of `size` bytes starting at `start`.
    pub fn with_size(
        name: impl Into<String>,
        start: u64,
        size: u64,
        permissions: Permissions,
    ) -> Result<Self> {
        let name = name.into();
        let end = size
            .checked_sub(1)
            .and_then(|last| start.checked_add(last))
            .ok_or_else(|| {
                Error::InvalidAddress(format!(
                    "region {} of size 0x{:X} at 0x{:X} is empty or overflows",
                    name, size, start
                ))
            })?;
        Self::new(name, start, end, permissions)
    }

    /// Mark the region as initialized or not
    pub fn initialized(mut self, initialized: bool) -> Self {
        self.initialized = initialized;
        self
    }

    /// Exclusive end address as stored in the container header.
    pub fn end_exclusive(&self) -> u64 {
        self.end.saturating_add(1)
    }

    /// Number of bytes in the region.
    pub fn size(&self) -> u64 {
        self.end_exclusive() - self.start
    }

    pub fn contains(&self, address: u64) -> bool {
        (self.start..=self.end).contains(&address)
    }
}
