//! Container export.
//!
//! `Exporter` turns an `ImageSource` into a buffered container;
//! `OutputTarget` delivers the finished buffer.

mod exporter;
mod sink;
mod summary;

pub use exporter::{Exporter, select_regions};
pub use sink::OutputTarget;
pub use summary::{ExportStream, ExportSummary, RegionReadFailure};

use std::sync::atomic::AtomicBool;

use tracing::info;

use crate::config::ExportOptions;
use crate::error::Result;
use crate::image::ImageSource;

/// Validate `target`, encode `source`, then write the whole container.
///
/// Nothing is written if the target is unusable or the export is cancelled.
pub fn export_to_target<S: ImageSource + ?Sized>(
    source: &S,
    target: &OutputTarget,
    options: &ExportOptions,
    shutdown: &AtomicBool,
) -> Result<ExportSummary> {
    target.validate()?;

    let stream = Exporter::new(options.clone()).export(source, shutdown)?;
    target.write_artifact(&stream.bytes)?;

    info!("Export complete: {} ({} bytes)", target, stream.len());
    Ok(stream.summary)
}
