//! # Status Command Implementation
//!
//! This module implements the `status` subcommand, which reports for each
//! module its declared pin, the commit the repository holds and whether a
//! `sync` would act on it. It is a read-only operation.
//!
//! ## Output Formats
//!
//! - **Table** (default): one aligned row per module
//! - **JSON** (`--json`): an array of objects, for scripts

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use subvend::config::Settings;
use subvend::inspect::{self, Drift};
use subvend::manifest::PinKind;
use subvend::output::OutputConfig;
use subvend::tracking::short;

/// Show which modules a sync would touch
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only report this module (repeatable)
    #[arg(short, long = "module", value_name = "NAME")]
    pub modules: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to the host repository
    #[arg(value_name = "REPO", default_value = ".")]
    pub repo: PathBuf,
}

/// One row of the report.
#[derive(Debug, Serialize)]
struct ModuleStatus {
    module: String,
    source: String,
    pin_kind: PinKind,
    pin: String,
    observed: Option<String>,
    state: Drift,
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs, settings: &Settings) -> Result<()> {
    let repo = settings.open_repository(&args.repo)?;
    let manifest = super::load_manifest(settings, &repo)?;

    let declared: Vec<&str> = manifest.names().collect();
    for name in &args.modules {
        if !manifest.contains(name) {
            return Err(subvend::suggestions::unknown_module(name, &declared));
        }
    }

    let base_branch = inspect::current_branch(&repo)?;
    let observed = inspect::observe(&repo, &base_branch, &manifest, &settings.manifest)?;

    let rows: Vec<ModuleStatus> = manifest
        .iter()
        .zip(observed)
        .filter(|((name, _), _)| args.modules.is_empty() || args.modules.iter().any(|m| m == name))
        .map(|((name, spec), state)| ModuleStatus {
            module: name.to_string(),
            source: spec.source.clone(),
            pin_kind: spec.pin_kind,
            pin: spec.pin_value.clone(),
            state: Drift::classify(spec, state.current_commit.as_deref()),
            observed: state.current_commit,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_table(&rows, &settings.output);
    }
    Ok(())
}

fn print_table(rows: &[ModuleStatus], output: &OutputConfig) {
    if rows.is_empty() {
        println!("No modules declared");
        return;
    }

    let headers = ["MODULE", "STATE", "PIN", "OBSERVED"];
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            [
                row.module.clone(),
                row.state.to_string(),
                format!("{} {}", row.pin_kind, short(&row.pin)),
                row.observed.as_deref().map(short).unwrap_or("-").to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    println!(
        "{:<w0$}  {:<w1$}  {:<w2$}  {}",
        headers[0],
        headers[1],
        headers[2],
        headers[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2]
    );
    for (row, status) in cells.iter().zip(rows) {
        let state = format!("{:<w$}", row[1], w = widths[1]);
        let state = if output.use_color {
            match status.state {
                Drift::UpToDate => console::style(state).green().to_string(),
                Drift::Stale | Drift::Absent => console::style(state).yellow().to_string(),
                Drift::Ref => console::style(state).cyan().to_string(),
            }
        } else {
            state
        };
        println!(
            "{:<w0$}  {}  {:<w2$}  {}",
            row[0],
            state,
            row[2],
            row[3],
            w0 = widths[0],
            w2 = widths[2]
        );
    }
}
