//! # Runtime Settings
//!
//! [`Settings`] gathers the knobs that shape a run: where the manifest lives,
//! how patiently fetches are retried, which `git` to run and how chatty to
//! be. The CLI fills it from global flags (with environment fallbacks); the
//! library only ever sees the finished value.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::defaults::{
    DEFAULT_FETCH_ATTEMPTS, DEFAULT_GIT_PROGRAM, DEFAULT_MANIFEST_FILENAME,
    DEFAULT_RATE_LIMIT_DELAY,
};
use crate::error::Result;
use crate::git::SystemGit;
use crate::output::{OutputConfig, Reporter};
use crate::repository::Repository;
use crate::retry::RetryPolicy;

/// Settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Manifest path, relative to the repository root.
    pub manifest: String,
    /// Fetch attempts per module, including the first.
    pub fetch_attempts: u32,
    /// Pause before retrying a rate-limited fetch.
    pub rate_limit_delay: Duration,
    /// The git executable.
    pub git_program: String,
    /// Echo progress and print captured command output on failure.
    pub verbose: bool,
    pub output: OutputConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            manifest: DEFAULT_MANIFEST_FILENAME.to_string(),
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
            git_program: DEFAULT_GIT_PROGRAM.to_string(),
            verbose: false,
            output: OutputConfig::default(),
        }
    }
}

impl Settings {
    /// Retry policy for fetching module upstreams.
    pub fn fetch_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.fetch_attempts, self.rate_limit_delay)
    }

    pub fn reporter(&self) -> Reporter {
        Reporter::new(self.verbose, self.output.clone())
    }

    /// Open the repository containing `path` with the configured git.
    pub fn open_repository(&self, path: &Path) -> Result<Repository> {
        Repository::discover(path, Box::new(SystemGit::with_program(&self.git_program)))
    }

    /// Absolute location of the manifest in `repo`.
    pub fn manifest_file(&self, repo: &Repository) -> PathBuf {
        repo.workdir().join(&self.manifest)
    }
}
