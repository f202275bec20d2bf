//! # Sync Command Implementation
//!
//! This module implements the `sync` subcommand. Only modules whose declared
//! pin differs from what the repository holds are touched; each is merged
//! into its existing tree so local modifications that upstream did not touch
//! are kept.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use subvend::config::Settings;
use subvend::reconcile::Mode;

/// Bring modules whose pin changed up to date
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Commit the updated modules and the manifest
    #[arg(long)]
    pub commit: bool,

    /// Path to the host repository
    #[arg(value_name = "REPO", default_value = ".")]
    pub repo: PathBuf,
}

/// Execute the `sync` command.
pub fn execute(args: SyncArgs, settings: &Settings) -> Result<()> {
    super::reconcile(settings, &args.repo, Mode::Sync, args.commit)?;
    Ok(())
}
