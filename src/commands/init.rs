//! # Init Command Implementation
//!
//! This module implements the `init` subcommand, which imports every module
//! declared in the manifest from scratch, ignoring any tracking branches left
//! by earlier runs. Modules whose tree already matches their pin produce no
//! change, so running `init` twice is harmless.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use subvend::config::Settings;
use subvend::reconcile::Mode;

/// Import every module in the manifest from scratch
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Commit the imported modules and the manifest
    #[arg(long)]
    pub commit: bool,

    /// Path to the host repository
    #[arg(value_name = "REPO", default_value = ".")]
    pub repo: PathBuf,
}

/// Execute the `init` command.
pub fn execute(args: InitArgs, settings: &Settings) -> Result<()> {
    super::reconcile(settings, &args.repo, Mode::Init, args.commit)?;
    Ok(())
}
