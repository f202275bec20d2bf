//! # subvend CLI
//!
//! This is the binary entry point for the `subvend` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Handling top-level application errors and translating them into user-friendly
//!   output, including the captured git output in verbose mode.
//!
//! The core application logic is defined in the `lib.rs` library crate, ensuring
//! that the binary is a thin wrapper around the reusable library functionality.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use console::style;

use subvend::error::Error;
use subvend::output::OutputConfig;
use subvend::suggestions;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let verbose = cli.is_verbose();
    let output = cli.output_config();

    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err, verbose, &output);
            ExitCode::FAILURE
        }
    }
}

fn report_failure(err: &anyhow::Error, verbose: bool, output: &OutputConfig) {
    let label = if output.use_color {
        style("Error:").red().bold().to_string()
    } else {
        "Error:".to_string()
    };
    eprintln!("{} {:#}", label, err);

    let Some(error) = err.chain().find_map(|cause| cause.downcast_ref::<Error>()) else {
        return;
    };

    if let Some((stdout, stderr)) = error.captured_output() {
        if verbose {
            eprintln!("====== stdout ======");
            eprintln!("{}", stdout.trim_end());
            eprintln!("====== stderr ======");
            eprintln!("{}", stderr.trim_end());
        } else {
            eprintln!("hint: Run with --verbose to see the output of the failed git command");
        }
    }
    for hint in suggestions::hints_for(error) {
        eprintln!("hint: {}", hint);
    }
}
