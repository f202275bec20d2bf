//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `subvend`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the global
//!   [`Settings`] and performs the command's logic.
//!
//! The `execute` function is the main entry point for the command and is
//! responsible for orchestrating the necessary operations, calling into the
//! `subvend` library to perform the core logic.

pub mod add;
pub mod clean;
pub mod completions;
pub mod init;
pub mod status;
pub mod sync;

use std::path::Path;

use anyhow::{Context, Result};

use subvend::config::Settings;
use subvend::manifest::Manifest;
use subvend::output::{emoji, OutputConfig};
use subvend::reconcile::{Mode, ReconcileOptions, ReconcileReport, Reconciler};
use subvend::repository::Repository;
use subvend::tracking::short;

/// Load the manifest of `repo`.
pub(crate) fn load_manifest(settings: &Settings, repo: &Repository) -> Result<Manifest> {
    let path = settings.manifest_file(repo);
    let manifest = Manifest::load(&path)
        .with_context(|| format!("Failed to load manifest {}", path.display()))?;
    Ok(manifest)
}

/// Run one reconciliation pass over the repository at `repo_path` and print
/// what it did.
pub(crate) fn reconcile(
    settings: &Settings,
    repo_path: &Path,
    mode: Mode,
    commit: bool,
) -> Result<ReconcileReport> {
    let repo = settings.open_repository(repo_path)?;
    let manifest = load_manifest(settings, &repo)?;
    let reporter = settings.reporter();

    let options = ReconcileOptions {
        mode,
        commit,
        manifest_path: settings.manifest.clone(),
    };
    let report = Reconciler::new(&repo, &reporter, settings.fetch_policy()).run(&manifest, &options)?;
    print_report(&report, &settings.output);
    Ok(report)
}

/// Print the outcome of a pass.
pub(crate) fn print_report(report: &ReconcileReport, output: &OutputConfig) {
    if report.changes.is_empty() {
        println!(
            "{} All modules on {} are up to date",
            emoji(output, "✅", "[OK]"),
            report.base_branch
        );
        return;
    }

    println!(
        "{} Updated {} module(s) on {}:",
        emoji(output, "📦", "[OK]"),
        report.changes.len(),
        report.base_branch
    );
    for change in &report.changes {
        let current = change.current.as_deref().map(short).unwrap_or("unknown");
        match change.previous.as_deref() {
            Some(previous) => println!("  {}: {} -> {}", change.module, short(previous), current),
            None => println!("  {}: new at {}", change.module, current),
        }
    }

    match &report.commit {
        Some(commit) => println!("Committed as {}", short(commit)),
        None => println!("Changes are left uncommitted; review them with 'git status'"),
    }
}
