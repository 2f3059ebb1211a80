//! Container encoder.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::config::{ExportOptions, ReadFailurePolicy, format};
use crate::error::{Error, Result};
use crate::format::ByteWriter;
use crate::image::{ImageSource, MemoryRegion};

use super::{ExportStream, ExportSummary, RegionReadFailure};

/// Region contents after the read phase, with any failure already resolved.
enum RegionData {
    Present(Vec<u8>),
    Zeros(usize),
    Omitted,
    Dropped,
}

impl RegionData {
    /// Bytes this region contributes to the data section.
    fn data_len(&self) -> usize {
        match self {
            RegionData::Present(bytes) => bytes.len(),
            RegionData::Zeros(count) => *count,
            RegionData::Omitted | RegionData::Dropped => 0,
        }
    }
}

/// Encodes an image source into a container.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    options: ExportOptions,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Encode `source` into a complete container.
    ///
    /// Regions are filtered to initialized ones and sorted by start address;
    /// symbols are filtered to non-default ones in enumeration order. Region
    /// read failures are logged, recorded in the summary and resolved per
    /// `ExportOptions::on_read_error`. A failed region too large to zero-fill
    /// is dropped instead.
    ///
    /// `shutdown` is polled before each region read and each symbol entry.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if `shutdown` is set; no partial container
    /// is returned. Returns `Error::BufferAllocation` if the container does
    /// not fit in memory.
    pub fn export<S: ImageSource + ?Sized>(
        &self,
        source: &S,
        shutdown: &AtomicBool,
    ) -> Result<ExportStream> {
        let policy = self.options.on_read_error;
        let mut summary = ExportSummary {
            program: source.name().to_string(),
            policy,
            regions_total: source.regions().len(),
            symbols_total: source.symbols().len(),
            ..ExportSummary::default()
        };

        let regions = select_regions(source.regions());
        summary.regions_uninitialized = summary.regions_total - regions.len();
        info!(
            "Writing {} segment headers for {} ({} uninitialized skipped)",
            regions.len(),
            source.name(),
            summary.regions_uninitialized
        );

        let mut contents = Vec::with_capacity(regions.len());
        for (index, region) in regions.iter().enumerate() {
            if shutdown.load(Ordering::Relaxed) {
                return Err(Error::Cancelled {
                    stage: "regions",
                    processed: index,
                });
            }
            contents.push(read_region(source, region, policy, &mut summary));
        }

        let exported: Vec<(&MemoryRegion, RegionData)> = regions
            .into_iter()
            .zip(contents)
            .filter(|(_, data)| !matches!(data, RegionData::Dropped))
            .collect();

        let fixed_size = format::REGION_COUNT_SIZE
            + exported.len() * format::REGION_HEADER_SIZE
            + format::SYMBOL_TABLE_PREAMBLE_SIZE;
        let capacity = exported
            .iter()
            .try_fold(fixed_size, |total, (_, data)| total.checked_add(data.data_len()))
            .ok_or_else(|| {
                Error::BufferAllocation("region data exceeds addressable memory".to_string())
            })?;
        let mut writer = ByteWriter::try_with_capacity(capacity)?;

        writer.write_len(exported.len());
        for (region, _) in &exported {
            writer.write_u64(region.start);
            writer.write_u64(region.end_exclusive());
            writer.write_u64(region.permissions.bits());
        }
        summary.regions_exported = exported.len();
        debug!("Segment headers written");

        let data_start = writer.len();
        for (_, data) in exported {
            match data {
                RegionData::Present(bytes) => writer.write_bytes(&bytes),
                RegionData::Zeros(count) => writer.write_zeros(count),
                RegionData::Omitted | RegionData::Dropped => {}
            }
        }
        summary.data_size = (writer.len() - data_start) as u64;
        debug!("Segment data written ({} bytes)", summary.data_size);

        let mut entries = ByteWriter::new();
        for (index, symbol) in source.symbols().iter().enumerate() {
            if shutdown.load(Ordering::Relaxed) {
                return Err(Error::Cancelled {
                    stage: "symbols",
                    processed: index,
                });
            }
            if symbol.is_default_generated() {
                summary.symbols_default_skipped += 1;
                continue;
            }
            entries.write_symbol_entry(symbol.address, &symbol.name);
            summary.symbols_exported += 1;
        }
        summary.symbol_payload_size = entries.len();

        writer.write_len(summary.symbols_exported);
        writer.write_len(summary.symbol_payload_size);
        writer.write_bytes(entries.as_slice());

        info!(
            "Exported {} symbols ({} default-generated skipped)",
            summary.symbols_exported, summary.symbols_default_skipped
        );

        summary.total_size = writer.len();
        Ok(ExportStream {
            bytes: writer.into_inner(),
            summary,
        })
    }
}

/// Initialized regions sorted by start address.
///
/// The sort is stable, so regions sharing a start keep source order.
pub fn select_regions(regions: &[MemoryRegion]) -> Vec<&MemoryRegion> {
    let mut selected: Vec<&MemoryRegion> = regions.iter().filter(|r| r.initialized).collect();
    selected.sort_by_key(|r| r.start);
    selected
}

fn read_region<S: ImageSource + ?Sized>(
    source: &S,
    region: &MemoryRegion,
    policy: ReadFailurePolicy,
    summary: &mut ExportSummary,
) -> RegionData {
    let result = source.read_region(region).and_then(|bytes| {
        if bytes.len() as u64 == region.size() {
            Ok(bytes)
        } else {
            Err(Error::RegionRead {
                region: region.name.clone(),
                address: region.start,
                message: format!(
                    "Read returned {} bytes, expected {}",
                    bytes.len(),
                    region.size()
                ),
            })
        }
    });

    let error = match result {
        Ok(bytes) => return RegionData::Present(bytes),
        Err(e) => e,
    };

    let (data, resolution) = match policy {
        ReadFailurePolicy::ZeroFill => match zero_fill_len(region.size()) {
            Some(count) => (RegionData::Zeros(count), ReadFailurePolicy::ZeroFill),
            None => (RegionData::Dropped, ReadFailurePolicy::DropRegion),
        },
        ReadFailurePolicy::Omit => (RegionData::Omitted, ReadFailurePolicy::Omit),
        ReadFailurePolicy::DropRegion => (RegionData::Dropped, ReadFailurePolicy::DropRegion),
    };
    if resolution != policy {
        warn!(
            "Region {} is too large to zero-fill (0x{:X} bytes), dropping it",
            region.name,
            region.size()
        );
    }

    warn!(
        "Failed to read bytes from memory block {} ({}), applying {}",
        region.name, error, resolution
    );
    summary.read_failures.push(RegionReadFailure {
        name: region.name.clone(),
        start: region.start,
        size: region.size(),
        message: error.to_string(),
        resolution,
    });
    data
}

/// Zero-fill length for a region, if a buffer of that size can exist.
fn zero_fill_len(size: u64) -> Option<usize> {
    usize::try_from(size)
        .ok()
        .filter(|&count| count <= isize::MAX as usize)
}
