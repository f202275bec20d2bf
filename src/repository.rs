//! # Host Repository Handle
//!
//! A [`Repository`] binds the working directory of the host repository to the
//! [`GitExecutor`] that runs commands in it. Every component receives a
//! `&Repository` and issues git commands only through it, which keeps the
//! process boundary in one place.
//!
//! The executor is a trait object so tests can swap the system `git` for a
//! scripted fake that records calls and replays canned output.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::git::{CommandOutput, GitExecutor, SystemGit};

/// The host repository subvend reconciles.
pub struct Repository {
    workdir: PathBuf,
    git: Box<dyn GitExecutor>,
}

impl Repository {
    /// Open `workdir` with the system `git`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self::with_executor(workdir, Box::new(SystemGit::new()))
    }

    /// Open `workdir` with a custom executor.
    pub fn with_executor(workdir: impl Into<PathBuf>, git: Box<dyn GitExecutor>) -> Self {
        Self {
            workdir: workdir.into(),
            git,
        }
    }

    /// Open the repository containing `path`, rooted at its top-level
    /// directory so module paths resolve against the repository root.
    pub fn discover(path: &Path, git: Box<dyn GitExecutor>) -> Result<Self> {
        let output = git.run(&["rev-parse", "--show-toplevel"], path, false)?;
        if !output.success() || output.stdout_trimmed().is_empty() {
            return Err(Error::RepositoryState {
                message: format!("{} is not inside a git work tree", path.display()),
            });
        }
        let workdir = PathBuf::from(output.stdout_trimmed());
        Ok(Self::with_executor(workdir, git))
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run a git command; a non-zero exit is an error.
    pub fn git(&self, args: &[&str]) -> Result<CommandOutput> {
        self.git.run(args, &self.workdir, true)
    }

    /// Run a git command whose failure the caller handles.
    pub fn git_unchecked(&self, args: &[&str]) -> Result<CommandOutput> {
        self.git.run(args, &self.workdir, false)
    }
}
