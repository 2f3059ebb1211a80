mod cli;
mod cli_utils;
mod commands;
mod shutdown;

use std::process::ExitCode;

use clap::Parser;
use cli::{Args, Command};

/// Exit status for an export interrupted by Ctrl+C.
const EXIT_CANCELLED: u8 = 130;

fn main() -> ExitCode {
    let args = Args::parse();
    cli_utils::init_logging(args.verbose, args.quiet);

    let result = match args.command {
        Command::Export {
            input,
            output,
            format,
            on_read_error,
            summary_json,
        } => commands::export::run(
            &input,
            &output,
            format.into(),
            on_read_error.into(),
            summary_json.as_deref(),
        ),
        Command::Inspect {
            artifact,
            json,
            symbols,
        } => commands::inspect::run(&artifact, json, symbols),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_cancelled(&e) => {
            eprintln!("Export cancelled, no artifact written");
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn is_cancelled(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<segexport_core::Error>()
        .is_some_and(segexport_core::Error::is_cancelled)
}
