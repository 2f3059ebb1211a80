//! Common CLI utility functions shared across commands.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::shutdown::ShutdownSignal;

/// Default log filter when `RUST_LOG` is not set.
pub fn default_filter(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "segexport=debug,segexport_core=debug"
    } else if quiet {
        "segexport=warn,segexport_core=warn"
    } else {
        "segexport=info,segexport_core=info"
    }
}

/// Initialize logging on stderr so stdout stays free for artifacts.
pub fn init_logging(verbose: bool, quiet: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, quiet)));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Install the Ctrl+C handler.
pub fn setup_shutdown_handler() -> Result<Arc<ShutdownSignal>> {
    let shutdown = Arc::new(ShutdownSignal::new());

    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        eprintln!("\nCancelling export...");
        shutdown_ctrlc.trigger();
    })
    .context("Failed to install Ctrl+C handler")?;

    Ok(shutdown)
}

/// Write `value` as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
