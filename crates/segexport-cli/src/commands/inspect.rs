//! Inspect command for decoding an exported container.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use segexport_core::format::ContainerRegion;
use segexport_core::{Container, Permissions};

/// Print the layout of a container file
pub fn run(artifact: &Path, json: bool, symbol_limit: usize) -> Result<()> {
    let bytes = fs::read(artifact)
        .with_context(|| format!("Failed to read {}", artifact.display()))?;
    let container = Container::parse(&bytes)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&container.summary())?);
        return Ok(());
    }

    println!("{}", artifact.display().bold());
    println!(
        "  {} bytes, {} regions, {} data bytes, {} symbols",
        container.total_size,
        container.regions.len(),
        container.data_size(),
        container.symbols.len()
    );

    println!();
    println!("{}", "Regions".bold());
    for region in &container.regions {
        println!("  {}", format_region(region));
    }

    println!();
    println!(
        "{} ({} payload bytes)",
        "Symbols".bold(),
        container.symbol_payload_size
    );
    for symbol in container.symbols.iter().take(symbol_limit) {
        println!("  {:#018x}  {}", symbol.address, symbol.name);
    }
    let hidden = container.symbols.len().saturating_sub(symbol_limit);
    if hidden > 0 {
        println!("  {}", format!("... {} more", hidden).dimmed());
    }

    Ok(())
}

fn format_region(region: &ContainerRegion<'_>) -> String {
    let header = &region.header;
    let perms = match header.flags() {
        Some(flags) => format_permissions(flags),
        None => format!("{:#x}", header.permissions).red().to_string(),
    };
    format!(
        "{:#018x}-{:#018x}  {}  {:>10} bytes",
        header.start,
        header.end_exclusive,
        perms,
        header.size()
    )
}

fn format_permissions(flags: Permissions) -> String {
    let text = flags.to_string();
    if flags.execute {
        text.red().to_string()
    } else if flags.write {
        text.yellow().to_string()
    } else {
        text.green().to_string()
    }
}
