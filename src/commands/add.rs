//! # Add Command Implementation
//!
//! This module implements the `add` subcommand, which declares a module in
//! the manifest (creating the manifest if needed) and imports it right away.
//!
//! ## Functionality
//!
//! - **Explicit Pin**: The module is pinned with either `--commit` or `--ref`
//! - **Name Detection**: The module name defaults to the source's basename
//!   without `.git`
//! - **Replacement**: An existing module is only replaced with `--force`, or
//!   after confirmation when running in a terminal
//! - **Import**: A sync pass imports the new module, committing the result
//!   with `--commit-result`

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::PathBuf;
use url::Url;

use subvend::config::Settings;
use subvend::manifest::{Manifest, ModuleSpec};
use subvend::output::emoji;
use subvend::reconcile::Mode;

/// Declare a new module and import it
#[derive(Args, Debug)]
pub struct AddArgs {
    /// URL or path of the module's upstream repository
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Pin the module to this commit
    #[arg(
        long,
        value_name = "HASH",
        conflicts_with = "reference",
        required_unless_present = "reference"
    )]
    pub commit: Option<String>,

    /// Make the module follow this branch or tag
    #[arg(long = "ref", value_name = "REF")]
    pub reference: Option<String>,

    /// Module name and directory (defaults to the source's basename)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Replace a module that is already declared under the same name
    #[arg(short, long)]
    pub force: bool,

    /// Commit the imported module and the manifest
    #[arg(long)]
    pub commit_result: bool,

    /// Path to the host repository
    #[arg(value_name = "REPO", default_value = ".")]
    pub repo: PathBuf,
}

/// Execute the `add` command.
pub fn execute(args: AddArgs, settings: &Settings) -> Result<()> {
    let repo = settings.open_repository(&args.repo)?;
    let manifest_path = settings.manifest_file(&repo);
    let mut manifest = if manifest_path.exists() {
        super::load_manifest(settings, &repo)?
    } else {
        Manifest::new()
    };

    let name = match args.name {
        Some(name) => name,
        None => module_name_from_source(&args.source)
            .ok_or_else(|| subvend::suggestions::module_name_required(&args.source))?,
    };
    if manifest.contains(&name) && !args.force && !confirm_replace(&name)? {
        return Err(subvend::suggestions::module_exists(&name));
    }

    let spec = match (args.commit, args.reference) {
        (Some(commit), _) => ModuleSpec::commit(&args.source, commit),
        (None, Some(reference)) => ModuleSpec::reference(&args.source, reference),
        (None, None) => anyhow::bail!("Either --commit or --ref is required"),
    };
    let pin = format!("{} {}", spec.pin_kind, spec.pin_value);

    manifest.insert(&name, spec)?;
    manifest
        .save(&manifest_path)
        .with_context(|| format!("Failed to write manifest {}", manifest_path.display()))?;
    println!(
        "{} Added {} ({}) to {}",
        emoji(&settings.output, "✅", "[OK]"),
        name,
        pin,
        settings.manifest
    );

    super::reconcile(settings, &args.repo, Mode::Sync, args.commit_result)?;
    Ok(())
}

/// Ask before replacing a declared module. Never asks without a terminal.
fn confirm_replace(name: &str) -> Result<bool> {
    if !console::user_attended() {
        return Ok(false);
    }
    let replace = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Module '{}' is already declared. Replace it?", name))
        .default(false)
        .interact()?;
    Ok(replace)
}

/// Derive a module name from the last path component of `source`.
fn module_name_from_source(source: &str) -> Option<String> {
    // scp-style sources and plain paths are not URLs
    let path = match Url::parse(source) {
        Ok(url) => url.path().to_string(),
        Err(_) => source.to_string(),
    };
    let trimmed = path.trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
