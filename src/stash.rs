//! # Stash Slot
//!
//! Parks uncommitted work in the git stash while a pass runs and puts it
//! back afterwards. Entries are pushed in the order they are parked and
//! restored in reverse, each with `stash apply` followed by `stash drop`.
//! The user's own entry keeps its split between staged and unstaged changes.
//!
//! An entry that fails to apply is never dropped: restoration stops there,
//! the entry stays on the stash, and the caller gets
//! [`Error::StashRestore`](crate::error::Error::StashRestore).

use log::debug;

use crate::defaults::STASH_MESSAGE_PREFIX;
use crate::error::{Error, Result};
use crate::inspect;
use crate::output::Reporter;
use crate::repository::Repository;

/// Label of the entry holding the user's own edits.
pub const LOCAL_EDITS: &str = "local edits";

/// The stash entries one pass has parked, oldest first.
#[derive(Debug)]
pub struct StashSlot {
    /// A repository without commits cannot stash.
    enabled: bool,
    parked: Vec<String>,
}

impl StashSlot {
    /// Open the slot for `repo`; parking is disabled until `HEAD` has a commit.
    pub fn open(repo: &Repository) -> Result<Self> {
        let enabled = inspect::has_commits(repo)?;
        if !enabled {
            debug!("Repository has no commits; stash parking disabled");
        }
        Ok(Self {
            enabled,
            parked: Vec::new(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Labels of the entries currently parked, oldest first.
    pub fn parked(&self) -> &[String] {
        &self.parked
    }

    /// Park the user's uncommitted edits to tracked files, if there are any.
    pub fn park_local_edits(&mut self, repo: &Repository, reporter: &Reporter) -> Result<bool> {
        let parked = self.park(repo, LOCAL_EDITS)?;
        if parked {
            reporter.info("Stashed local edits for the duration of the pass");
        }
        Ok(parked)
    }

    /// Park whatever tracked changes the working tree and index hold under
    /// `label`. Returns whether an entry was created.
    pub fn park(&mut self, repo: &Repository, label: &str) -> Result<bool> {
        if !self.enabled || !inspect::has_local_changes(repo)? {
            return Ok(false);
        }
        let message = format!("{} {}", STASH_MESSAGE_PREFIX, label);
        repo.git(&["stash", "push", "--quiet", "--message", &message])?;
        debug!("Parked {:?}", message);
        self.parked.push(label.to_string());
        Ok(true)
    }

    /// Apply and drop every parked entry, newest first.
    ///
    /// Module entries go back with a plain `stash apply`. Before the user's
    /// own entry the index is reset to `HEAD`, so it can be applied with
    /// `--index` and whatever they had staged is staged again. The restored
    /// module paths are staged last.
    pub fn restore_all(&mut self, repo: &Repository, reporter: &Reporter) -> Result<()> {
        let mut modules: Vec<String> = Vec::new();
        let result = self.restore_entries(repo, reporter, &mut modules);

        if !modules.is_empty() {
            let mut args = vec!["add", "--all", "--"];
            args.extend(modules.iter().map(String::as_str));
            match (repo.git(&args), &result) {
                (Err(err), Ok(())) => return Err(err),
                (Err(err), Err(_)) => debug!("Could not stage restored modules: {}", err),
                (Ok(_), _) => {}
            }
        }
        result
    }

    fn restore_entries(
        &mut self,
        repo: &Repository,
        reporter: &Reporter,
        modules: &mut Vec<String>,
    ) -> Result<()> {
        while let Some(label) = self.parked.last() {
            let local_edits = label == LOCAL_EDITS;
            if local_edits && !modules.is_empty() {
                repo.git(&["reset", "--quiet"])?;
            }

            let apply: &[&str] = if local_edits {
                &["stash", "apply", "--index", "--quiet", "stash@{0}"]
            } else {
                &["stash", "apply", "--quiet", "stash@{0}"]
            };
            let output = repo.git_unchecked(apply)?;
            if !output.success() {
                reporter.warn(&format!(
                    "Could not restore stashed {}; it is kept as stash@{{0}}",
                    label
                ));
                return Err(Error::StashRestore {
                    stash: format!("{} {}", STASH_MESSAGE_PREFIX, label),
                    stdout: output.stdout,
                    stderr: output.stderr,
                    cause: None,
                });
            }
            repo.git(&["stash", "drop", "--quiet", "stash@{0}"])?;
            debug!("Restored {:?}", label);

            if let Some(label) = self.parked.pop() {
                if !local_edits {
                    modules.push(label);
                }
            }
        }
        Ok(())
    }
}
