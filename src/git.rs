//! # Git Executor
//!
//! Every interaction with version control goes through [`GitExecutor::run`].
//! Commands are passed as argument vectors straight to the process, never
//! through a shell, so module names, URLs and commit messages need no quoting.
//!
//! The default implementation, [`SystemGit`], uses the system `git` binary,
//! which automatically picks up:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Personal access tokens
//! - Any authentication configured in ~/.gitconfig

use std::path::Path;
use std::process::Command;

use log::debug;

use crate::defaults::DEFAULT_GIT_PROGRAM;
use crate::error::{Error, Result};

/// Exit status and captured output of one git invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Process exit code; `-1` when the process was terminated by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Returns true when the command exited with status zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Stdout with surrounding whitespace removed.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Rough class of a failed git invocation, derived from its stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The remote asked us to slow down.
    RateLimited,
    /// Credentials were missing or rejected.
    Auth,
    /// The remote could not be reached.
    Network,
    Other,
}

impl FailureKind {
    /// Classify a failure from the stderr git printed.
    pub fn classify(stderr: &str) -> Self {
        let lower = stderr.to_lowercase();
        if lower.contains("rate limit")
            || lower.contains("too many requests")
            || lower.contains("error: 429")
        {
            FailureKind::RateLimited
        } else if lower.contains("authentication failed")
            || lower.contains("permission denied")
            || lower.contains("could not read username")
            || lower.contains("returned error: 403")
        {
            FailureKind::Auth
        } else if lower.contains("could not resolve host")
            || lower.contains("unable to access")
            || lower.contains("connection timed out")
            || lower.contains("connection refused")
            || lower.contains("could not read from remote repository")
            || lower.contains("the remote end hung up")
        {
            FailureKind::Network
        } else {
            FailureKind::Other
        }
    }
}

/// Runs git sub-commands against a working directory.
///
/// Implementations must not interpret `args` through a shell. When
/// `fail_on_nonzero` is true a non-zero exit becomes [`Error::Execution`];
/// otherwise the caller inspects [`CommandOutput::status`] itself.
pub trait GitExecutor: Send + Sync {
    fn run(&self, args: &[&str], workdir: &Path, fail_on_nonzero: bool) -> Result<CommandOutput>;
}

/// The default executor: spawns the system `git` binary.
#[derive(Debug, Clone)]
pub struct SystemGit {
    program: String,
}

impl SystemGit {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_GIT_PROGRAM)
    }

    /// Use a specific git executable instead of the one on `PATH`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new()
    }
}

impl GitExecutor for SystemGit {
    fn run(&self, args: &[&str], workdir: &Path, fail_on_nonzero: bool) -> Result<CommandOutput> {
        let rendered = render_command(&self.program, args);
        debug!("Executing command: {} (in {})", rendered, workdir.display());

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(workdir)
            .output()
            .map_err(|e| Error::Spawn {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        let result = CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() && fail_on_nonzero {
            return Err(Error::Execution {
                command: rendered,
                stdout: result.stdout,
                stderr: result.stderr,
            });
        }
        Ok(result)
    }
}

/// Render a command line for logs and error messages.
pub fn render_command(program: &str, args: &[&str]) -> String {
    let mut rendered = String::from(program);
    for arg in args {
        rendered.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            rendered.push('\'');
            rendered.push_str(&arg.replace('\'', "'\\''"));
            rendered.push('\'');
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}
