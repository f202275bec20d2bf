//! # Clean Command Implementation
//!
//! This module implements the `clean` subcommand, which deletes the tracking
//! branches (and their remotes) of every declared module once the base
//! branch's reconciliation is final. Branches that are already gone are
//! reported as warnings; the command still succeeds.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use subvend::cleanup;
use subvend::config::Settings;
use subvend::inspect;
use subvend::output::emoji;

/// Delete the tracking branches of a base branch
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Base branch whose tracking branches are deleted (defaults to the current branch)
    #[arg(short, long, value_name = "NAME")]
    pub branch: Option<String>,

    /// Path to the host repository
    #[arg(value_name = "REPO", default_value = ".")]
    pub repo: PathBuf,
}

/// Execute the `clean` command.
pub fn execute(args: CleanArgs, settings: &Settings) -> Result<()> {
    let repo = settings.open_repository(&args.repo)?;
    let manifest = super::load_manifest(settings, &repo)?;
    let reporter = settings.reporter();

    let base_branch = match args.branch {
        Some(branch) => branch,
        None => inspect::current_branch(&repo)?,
    };
    let modules: Vec<&str> = manifest.names().collect();

    let summary = cleanup::remove_tracking_branches(&repo, &base_branch, &modules, &reporter)?;
    cleanup::remove_tracking_remotes(&repo, &base_branch, &modules)?;

    println!(
        "{} Removed {} tracking branch(es) for {}",
        emoji(&settings.output, "🧹", "[OK]"),
        summary.removed.len(),
        base_branch
    );
    Ok(())
}
