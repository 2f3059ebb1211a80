//! Mock image source for testing
//!
//! Provides a configurable in-memory implementation of the ImageSource trait
//! with support for injected region read failures.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::image::{ImageSource, MemoryRegion, Permissions, Symbol, SymbolSource};

/// Mock image source for testing
///
/// Region contents are held in memory keyed by region index, so regions
/// sharing a start address stay distinct. Regions registered as failing
/// return `RegionRead` errors when read.
#[derive(Debug, Clone, Default)]
pub struct MockImage {
    name: String,
    regions: Vec<MemoryRegion>,
    symbols: Vec<Symbol>,
    data: HashMap<usize, Vec<u8>>,
    failing: HashSet<usize>,
}

impl MockImage {
    /// Create a builder for a mock image
    pub fn builder() -> MockImageBuilder {
        MockImageBuilder::new()
    }

    /// Index of `region`, by identity first, then by start and name.
    fn index_of(&self, region: &MemoryRegion) -> Option<usize> {
        self.regions
            .iter()
            .position(|r| std::ptr::eq(r, region))
            .or_else(|| {
                self.regions
                    .iter()
                    .position(|r| r.start == region.start && r.name == region.name)
            })
    }
}

impl ImageSource for MockImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    fn read_region(&self, region: &MemoryRegion) -> Result<Vec<u8>> {
        let index = self.index_of(region);
        if index.is_some_and(|i| self.failing.contains(&i)) {
            return Err(Error::RegionRead {
                region: region.name.clone(),
                address: region.start,
                message: "Injected read failure".to_string(),
            });
        }
        let data = index.and_then(|i| self.data.get(&i)).ok_or_else(|| Error::RegionRead {
            region: region.name.clone(),
            address: region.start,
            message: "No backing data".to_string(),
        })?;
        if data.len() as u64 != region.size() {
            return Err(Error::RegionRead {
                region: region.name.clone(),
                address: region.start,
                message: format!(
                    "Backing data is {} bytes, region is {} bytes",
                    data.len(),
                    region.size()
                ),
            });
        }
        Ok(data.clone())
    }
}

/// Builder for creating mock images
///
/// Provides a fluent API for constructing region and symbol layouts.
/// Regions and symbols keep the order in which they were added.
#[derive(Debug, Clone)]
pub struct MockImageBuilder {
    image: MockImage,
}

impl Default for MockImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockImageBuilder {
    /// Create a new builder for an image named "mock"
    pub fn new() -> Self {
        Self {
            image: MockImage {
                name: "mock".to_string(),
                ..MockImage::default()
            },
        }
    }

    /// Set the program name
    pub fn name(mut self, name: &str) -> Self {
        self.image.name = name.to_string();
        self
    }

    /// Add an initialized region backed by `bytes`
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is empty.
    pub fn region(mut self, name: &str, start: u64, permissions: Permissions, bytes: Vec<u8>) -> Self {
        let region = Self::make_region(name, start, bytes.len() as u64, permissions);
        self.image.data.insert(self.image.regions.len(), bytes);
        self.image.regions.push(region);
        self
    }

    /// Add an initialized region of `size` bytes filled with `fill`
    pub fn filled_region(
        self,
        name: &str,
        start: u64,
        size: usize,
        permissions: Permissions,
        fill: u8,
    ) -> Self {
        self.region(name, start, permissions, vec![fill; size])
    }

    /// Add an uninitialized region (no backing data)
    pub fn uninitialized(mut self, name: &str, start: u64, size: u64, permissions: Permissions) -> Self {
        let region = Self::make_region(name, start, size, permissions).initialized(false);
        self.image.regions.push(region);
        self
    }

    /// Add an initialized region whose reads always fail
    pub fn failing_region(mut self, name: &str, start: u64, size: u64, permissions: Permissions) -> Self {
        let region = Self::make_region(name, start, size, permissions);
        self.image.failing.insert(self.image.regions.len());
        self.image.regions.push(region);
        self
    }

    /// Add a user-defined symbol
    pub fn symbol(self, address: u64, name: &str) -> Self {
        self.symbol_with_source(address, name, SymbolSource::UserDefined)
    }

    /// Add a default-generated placeholder symbol
    pub fn generated_symbol(self, address: u64, name: &str) -> Self {
        self.symbol_with_source(address, name, SymbolSource::Default)
    }

    /// Add a symbol with an explicit source
    pub fn symbol_with_source(mut self, address: u64, name: &str, source: SymbolSource) -> Self {
        self.image.symbols.push(Symbol::new(address, name, source));
        self
    }

    /// Build the MockImage
    pub fn build(self) -> MockImage {
        self.image
    }

    fn make_region(name: &str, start: u64, size: u64, permissions: Permissions) -> MemoryRegion {
        MemoryRegion::with_size(name, start, size, permissions)
            .unwrap_or_else(|e| panic!("invalid mock region {}: {}", name, e))
    }
}
