//! CLI argument definitions for segexport.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use segexport_core::{InputFormat, ReadFailurePolicy};

#[derive(Parser)]
#[command(name = "segexport")]
#[command(about = "Export analyzed program images as flat segment containers", version)]
pub struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Export a program image to a segment container
    Export {
        /// Input image (JSON manifest or ELF binary)
        input: PathBuf,
        /// Output file path (`-` for stdout)
        #[arg(short, long, env = "SEGEXPORT_OUTPUT")]
        output: String,
        /// Input format
        #[arg(long, value_enum, default_value = "auto")]
        format: FormatArg,
        /// What to write when a region cannot be read
        #[arg(
            long,
            value_enum,
            env = "SEGEXPORT_ON_READ_ERROR",
            default_value = "zero-fill"
        )]
        on_read_error: ReadErrorArg,
        /// Write the export summary as JSON
        #[arg(long, value_name = "FILE")]
        summary_json: Option<PathBuf>,
    },
    /// Show the contents of an exported container
    Inspect {
        /// Container file
        artifact: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Number of symbols to list (default: 20)
        #[arg(long, default_value = "20")]
        symbols: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Auto,
    Manifest,
    Elf,
}

impl From<FormatArg> for InputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Auto => InputFormat::Auto,
            FormatArg::Manifest => InputFormat::Manifest,
            FormatArg::Elf => InputFormat::Elf,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReadErrorArg {
    ZeroFill,
    Omit,
    DropRegion,
}

impl From<ReadErrorArg> for ReadFailurePolicy {
    fn from(arg: ReadErrorArg) -> Self {
        match arg {
            ReadErrorArg::ZeroFill => ReadFailurePolicy::ZeroFill,
            ReadErrorArg::Omit => ReadFailurePolicy::Omit,
            ReadErrorArg::DropRegion => ReadFailurePolicy::DropRegion,
        }
    }
}
