//! # segexport-core
//!
//! Core library for exporting an analyzed program image as a flat
//! segment container.
//!
//! This crate provides:
//! - Image model (memory regions, permissions, symbols) and the `ImageSource` trait
//! - Loaders for JSON manifests and ELF binaries
//! - The container encoder with configurable read-failure handling
//! - A decoder for inspecting finished containers
//!
//! ## Feature Flags
//!
//! - `elf` (default): Enables `ElfImage`, backed by goblin.

pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod image;
pub mod loader;

// Re-export from config module
pub use config::{ExportOptions, ReadFailurePolicy};

// Re-export from error module
pub use error::{Error, Result};

// Re-export from export module
pub use export::{
    ExportStream, ExportSummary, Exporter, OutputTarget, RegionReadFailure, export_to_target,
    select_regions,
};

// Re-export from format module
pub use format::{Container, ContainerSummary, RegionSummary};

// Re-export from image module
pub use image::{ImageSource, MemoryRegion, Permissions, Symbol, SymbolSource};

// Re-export from loader module
#[cfg(feature = "elf")]
pub use loader::ElfImage;
pub use loader::{InputFormat, ManifestImage, detect_format, open_image, parse_address};
