//! # Error Handling
//!
//! This module defines the centralized error type for `subvend`. It uses the
//! `thiserror` library to build one `Error` enum covering every way a
//! reconciliation pass can fail, with enough captured context (the git
//! command, its stdout and stderr) to diagnose the failure afterwards.
//!
//! ## Taxonomy
//!
//! - **`Execution`**: a git invocation exited non-zero where failure was not
//!   tolerated.
//! - **`Fetch`**: fetching a module's upstream failed on every attempt.
//! - **`RepositoryState`**: the repository is in a state the engine cannot
//!   interpret, such as a detached `HEAD`.
//! - **`StashRestore`**: parked local edits could not be restored. The stash
//!   entry is left in place on this path.
//! - **`Reconciliation`**: a local step of reconciling one module failed.
//!
//! Manifest, I/O and serialization errors round out the enum.

use thiserror::Error;

/// Main error type for subvend operations
#[derive(Error, Debug)]
pub enum Error {
    /// A git command exited non-zero and the caller did not tolerate it.
    #[error("git command failed: {command}")]
    Execution {
        command: String,
        stdout: String,
        stderr: String,
    },

    /// The git executable could not be started at all.
    #[error("Failed to run {program}: {message}")]
    Spawn { program: String, message: String },

    /// Fetching a module's upstream failed on every attempt.
    #[error("Failed to fetch module {module} after {attempts} attempt(s): {last_error}")]
    Fetch {
        module: String,
        attempts: u32,
        last_error: String,
    },

    /// The repository is in a state that cannot be interpreted.
    #[error("Repository state error: {message}")]
    RepositoryState { message: String },

    /// Parked changes could not be applied back onto the working tree.
    ///
    /// The stash entry named by `stash` is still present.
    #[error("Failed to restore stashed changes ({stash}){}", cause.as_ref().map(|c| format!("\n  after: {}", c)).unwrap_or_default())]
    StashRestore {
        stash: String,
        stdout: String,
        stderr: String,
        /// Summary of the failure that was being unwound, if any
        cause: Option<String>,
    },

    /// A local step of reconciling one module failed.
    #[error("Failed to reconcile module {module} during {stage}")]
    Reconciliation {
        module: String,
        stage: String,
        stdout: String,
        stderr: String,
    },

    /// The manifest file could not be parsed.
    #[error("Manifest parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ManifestParse {
        message: String,
        /// Optional hint for how to fix the manifest
        hint: Option<String>,
    },

    /// The manifest file does not exist.
    #[error("Manifest not found: {path}")]
    ManifestNotFound { path: String },

    /// A module name was not found in the manifest.
    #[error("Unknown module: {name}")]
    UnknownModule { name: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Captured stdout and stderr of the git command behind this error, if any.
    pub fn captured_output(&self) -> Option<(&str, &str)> {
        match self {
            Error::Execution { stdout, stderr, .. }
            | Error::StashRestore { stdout, stderr, .. }
            | Error::Reconciliation { stdout, stderr, .. } => Some((stdout, stderr)),
            _ => None,
        }
    }

    /// Re-label an executor failure as a failed reconciliation stage.
    ///
    /// Other errors pass through untouched.
    pub fn at_stage(self, module: &str, stage: &str) -> Self {
        match self {
            Error::Execution { stdout, stderr, .. } => Error::Reconciliation {
                module: module.to_string(),
                stage: stage.to_string(),
                stdout,
                stderr,
            },
            other => other,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
