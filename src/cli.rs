//! CLI argument parsing and command dispatch

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use subvend::config::Settings;
use subvend::defaults::{
    DEFAULT_FETCH_ATTEMPTS, DEFAULT_GIT_PROGRAM, DEFAULT_MANIFEST_FILENAME,
    DEFAULT_RATE_LIMIT_DELAY,
};
use subvend::output::OutputConfig;

use crate::commands;

/// subvend - Vendor pinned upstream repositories into subdirectories
#[derive(Parser, Debug)]
#[command(name = "subvend")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Manifest file, relative to the repository root
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "SUBVEND_MANIFEST",
        default_value = DEFAULT_MANIFEST_FILENAME
    )]
    manifest: String,

    /// How many times to try fetching a module's upstream
    #[arg(
        long,
        global = true,
        value_name = "N",
        env = "SUBVEND_FETCH_ATTEMPTS",
        default_value_t = DEFAULT_FETCH_ATTEMPTS
    )]
    fetch_attempts: u32,

    /// Seconds to wait before retrying a rate-limited fetch
    #[arg(
        long,
        global = true,
        value_name = "SECONDS",
        env = "SUBVEND_RATE_LIMIT_DELAY",
        default_value_t = DEFAULT_RATE_LIMIT_DELAY.as_secs()
    )]
    rate_limit_delay: u64,

    /// The git executable to run
    #[arg(
        long = "git",
        global = true,
        value_name = "PROGRAM",
        env = "SUBVEND_GIT",
        default_value = DEFAULT_GIT_PROGRAM
    )]
    git_program: String,

    /// Show progress and the output of failed git commands
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import every module in the manifest from scratch
    Init(commands::init::InitArgs),

    /// Bring modules whose pin changed up to date
    Sync(commands::sync::SyncArgs),

    /// Declare a new module and import it
    Add(commands::add::AddArgs),

    /// Show which modules a sync would touch
    Status(commands::status::StatusArgs),

    /// Delete the tracking branches of a base branch
    Clean(commands::clean::CleanArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn output_config(&self) -> OutputConfig {
        OutputConfig::from_env_and_flag(&self.color)
    }

    fn settings(&self) -> Settings {
        Settings {
            manifest: self.manifest.clone(),
            fetch_attempts: self.fetch_attempts,
            rate_limit_delay: Duration::from_secs(self.rate_limit_delay),
            git_program: self.git_program.clone(),
            verbose: self.verbose,
            output: self.output_config(),
        }
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // RUST_LOG takes precedence over --log-level
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(&self.log_level),
        )
        .format_target(false)
        .try_init();

        let settings = self.settings();
        match self.command {
            Commands::Init(args) => commands::init::execute(args, &settings),
            Commands::Sync(args) => commands::sync::execute(args, &settings),
            Commands::Add(args) => commands::add::execute(args, &settings),
            Commands::Status(args) => commands::status::execute(args, &settings),
            Commands::Clean(args) => commands::clean::execute(args, &settings),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
