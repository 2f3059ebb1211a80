//! JSON manifest image source.
//!
//! A manifest describes an analyzed image whose region contents live in
//! separate files, typically dumped by an analysis host:
//!
//! ```json
//! {
//!   "program": "AppleAVD",
//!   "regions": [
//!     { "name": "__TEXT", "start": "0x1000", "end": "0x1fff",
//!       "permissions": "r-x", "file": "text.bin", "offset": 0 },
//!     { "name": "__bss", "start": "0x3000", "end": "0x3fff",
//!       "permissions": "rw-", "initialized": false }
//!   ],
//!   "symbols": [
//!     { "address": "0x1050", "name": "init_fn", "source": "user_defined" },
//!     { "address": "0x2010", "name": "FUN_2010", "source": "default" }
//!   ]
//! }
//! ```
//!
//! Backing files resolve relative to the manifest and are read lazily, so a
//! missing file only fails its own region.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::image::{ImageSource, MemoryRegion, Permissions, Symbol, SymbolSource};

use super::parse_address;

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    program: Option<String>,
    #[serde(default)]
    regions: Vec<RegionEntry>,
    #[serde(default)]
    symbols: Vec<SymbolEntry>,
}

#[derive(Debug, Deserialize)]
struct RegionEntry {
    name: String,
    #[serde(deserialize_with = "deserialize_address")]
    start: u64,
    /// Last byte address (inclusive).
    #[serde(deserialize_with = "deserialize_address")]
    end: u64,
    permissions: Permissions,
    #[serde(default = "default_initialized")]
    initialized: bool,
    #[serde(default)]
    file: Option<PathBuf>,
    #[serde(default, deserialize_with = "deserialize_address")]
    offset: u64,
}

#[derive(Debug, Deserialize)]
struct SymbolEntry {
    #[serde(deserialize_with = "deserialize_address")]
    address: u64,
    name: String,
    #[serde(default)]
    source: SymbolSource,
}

fn default_initialized() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AddressValue {
    Number(u64),
    Text(String),
}

fn deserialize_address<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match AddressValue::deserialize(deserializer)? {
        AddressValue::Number(n) => Ok(n),
        AddressValue::Text(s) => parse_address(&s).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone)]
struct Backing {
    path: PathBuf,
    offset: u64,
}

/// Image source backed by a JSON manifest and per-region data files.
#[derive(Debug, Clone)]
pub struct ManifestImage {
    name: String,
    regions: Vec<MemoryRegion>,
    symbols: Vec<Symbol>,
    backing: Vec<Option<Backing>>,
}

impl ManifestImage {
    /// Load a manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns `NoProgram` if the file cannot be read and `Manifest` if it is
    /// not a valid manifest.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::NoProgram(format!("{}: {}", path.display(), e)))?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let fallback_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("program");

        Self::from_json(&content, base_dir, fallback_name).map_err(|e| match e {
            Error::Json(e) => Error::Manifest(format!("{}: {}", path.display(), e)),
            other => other,
        })
    }

    /// Parse a manifest from a JSON string.
    ///
    /// Relative backing files resolve against `base_dir`. `fallback_name` is
    /// used when the manifest has no `program` field.
    pub fn from_json(json: &str, base_dir: &Path, fallback_name: &str) -> Result<Self> {
        let manifest: ManifestFile = serde_json::from_str(json)?;

        let mut regions = Vec::with_capacity(manifest.regions.len());
        let mut backing = Vec::with_capacity(manifest.regions.len());
        for (index, entry) in manifest.regions.into_iter().enumerate() {
            let region = MemoryRegion::new(entry.name, entry.start, entry.end, entry.permissions)
                .map_err(|e| Error::Manifest(format!("region #{}: {}", index, e)))?
                .initialized(entry.initialized);

            let source = match (entry.initialized, entry.file) {
                (true, Some(file)) => Some(Backing {
                    path: base_dir.join(file),
                    offset: entry.offset,
                }),
                (true, None) => {
                    warn!("Region {} is initialized but has no backing file", region.name);
                    None
                }
                (false, Some(_)) => {
                    debug!("Ignoring backing file of uninitialized region {}", region.name);
                    None
                }
                (false, None) => None,
            };

            regions.push(region);
            backing.push(source);
        }

        let symbols = manifest
            .symbols
            .into_iter()
            .map(|s| Symbol::new(s.address, s.name, s.source))
            .collect();

        Ok(Self {
            name: manifest.program.unwrap_or_else(|| fallback_name.to_string()),
            regions,
            symbols,
            backing,
        })
    }

    fn backing_for(&self, region: &MemoryRegion) -> Option<&Backing> {
        let index = self
            .regions
            .iter()
            .position(|r| std::ptr::eq(r, region))
            .or_else(|| self.regions.iter().position(|r| r == region))?;
        self.backing[index].as_ref()
    }
}

impl ImageSource for ManifestImage {
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
        let read_error = |message: String| Error::RegionRead {
            region: region.name.clone(),
            address: region.start,
            message,
        };

        let backing = self
            .backing_for(region)
            .ok_or_else(|| read_error("No backing file".to_string()))?;

        let size = usize::try_from(region.size())
            .map_err(|_| read_error(format!("Region size 0x{:X} too large", region.size())))?;

        read_exact_at(&backing.path, backing.offset, size).map_err(|e| {
            read_error(format!(
                "{} at offset 0x{:X}: {}",
                backing.path.display(),
                backing.offset,
                e
            ))
        })
    }
}

fn read_exact_at(path: &Path, offset: u64, size: usize) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buffer = vec![0u8; size];
    file.read_exact(&mut buffer)?;
    Ok(buffer)
}
