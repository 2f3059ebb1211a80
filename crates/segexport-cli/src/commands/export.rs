//! Export command for writing a segment container.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use segexport_core::{
    ExportOptions, ExportSummary, ImageSource, InputFormat, OutputTarget, ReadFailurePolicy,
    export_to_target, open_image,
};

use crate::cli_utils;

/// Export `input` to `output`
pub fn run(
    input: &Path,
    output: &str,
    format: InputFormat,
    policy: ReadFailurePolicy,
    summary_json: Option<&Path>,
) -> Result<()> {
    let current_version = env!("CARGO_PKG_VERSION");
    eprintln!("segexport {} - Export Mode", current_version);

    // Fail on a bad destination before touching the input
    let target = OutputTarget::from_arg(output);
    target.validate()?;

    let image = open_image(input, format)?;
    eprintln!(
        "Loaded {} ({} regions, {} symbols)",
        image.name(),
        image.regions().len(),
        image.symbols().len()
    );

    let shutdown = cli_utils::setup_shutdown_handler()?;
    let options = ExportOptions::new().with_read_failure_policy(policy);
    let summary = export_to_target(&*image, &target, &options, shutdown.flag())?;

    for failure in &summary.read_failures {
        eprintln!(
            "{} {} at 0x{:X}: {} ({})",
            "[WARN]".yellow(),
            failure.name,
            failure.start,
            failure.message,
            failure.resolution
        );
    }
    if !summary.is_aligned() {
        eprintln!(
            "{} Region data is misaligned; sequential readers will misparse this container",
            "[WARN]".yellow()
        );
    }

    if let Some(path) = summary_json {
        write_summary(path, &summary);
    }

    eprintln!(
        "{} Export complete: {} ({} regions, {} symbols, {} bytes)",
        "[SUCCESS]".green().bold(),
        target,
        summary.regions_exported,
        summary.symbols_exported,
        summary.total_size
    );
    Ok(())
}

/// Write the summary JSON. The artifact is already on disk, so a failure
/// here is only a warning.
fn write_summary(path: &Path, summary: &ExportSummary) -> bool {
    match cli_utils::write_json(path, summary) {
        Ok(()) => {
            eprintln!("Summary written to: {}", path.display());
            true
        }
        Err(e) => {
            eprintln!("{} Failed to write summary: {:#}", "[WARN]".yellow(), e);
            false
        }
    }
}
