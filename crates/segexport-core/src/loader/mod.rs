//! Image loaders.
//!
//! Turns files on disk into `ImageSource` implementations:
//! - `ManifestImage` - JSON manifest plus per-region data files
//! - `ElfImage` - ELF executables and objects (requires the `elf` feature)

#[cfg(feature = "elf")]
mod elf;
mod manifest;

#[cfg(feature = "elf")]
pub use elf::{ElfImage, is_mapping_symbol};
pub use manifest::ManifestImage;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::debug;

use crate::error::{Error, Result};
use crate::image::ImageSource;

/// ELF magic bytes.
pub const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// Input file format.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum InputFormat {
    /// Detect from the file's leading bytes.
    #[default]
    Auto,
    Manifest,
    Elf,
}

/// Open `path` as an image source.
///
/// # Errors
///
/// Returns `NoProgram` if the path does not exist or cannot be read.
pub fn open_image(path: &Path, format: InputFormat) -> Result<Box<dyn ImageSource>> {
    if !path.is_file() {
        return Err(Error::NoProgram(format!(
            "{} does not exist or is not a file",
            path.display()
        )));
    }

    let format = match format {
        InputFormat::Auto => detect_format(path)?,
        other => other,
    };
    debug!("Opening {} as {}", path.display(), format);

    match format {
        InputFormat::Manifest | InputFormat::Auto => Ok(Box::new(ManifestImage::load(path)?)),
        #[cfg(feature = "elf")]
        InputFormat::Elf => Ok(Box::new(ElfImage::load(path)?)),
        #[cfg(not(feature = "elf"))]
        InputFormat::Elf => Err(Error::BinaryParse(
            "ELF support not compiled in (enable the `elf` feature)".to_string(),
        )),
    }
}

/// Guess the input format from the file's magic bytes.
pub fn detect_format(path: &Path) -> Result<InputFormat> {
    let mut magic = [0u8; ELF_MAGIC.len()];
    let mut file =
        File::open(path).map_err(|e| Error::NoProgram(format!("{}: {}", path.display(), e)))?;
    let read = file.read(&mut magic)?;

    if read == magic.len() && &magic == ELF_MAGIC {
        Ok(InputFormat::Elf)
    } else {
        Ok(InputFormat::Manifest)
    }
}

/// Parse an address written as `0x`-prefixed hex or plain decimal.
///
/// Underscores are ignored, so `0xffff_0000` is accepted.
pub fn parse_address(text: &str) -> Result<u64> {
    let cleaned: String = text.trim().chars().filter(|&c| c != '_').collect();
    let parsed = if let Some(hex) = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)
    } else {
        cleaned.parse::<u64>()
    };
    parsed.map_err(|e| Error::InvalidAddress(format!("{:?}: {}", text, e)))
}
