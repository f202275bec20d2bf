//! # Reconciliation Driver
//!
//! Converges the host repository on the manifest, one module at a time in
//! manifest order:
//!
//! 1. Observe every module and work out which ones drifted. Modules an
//!    earlier pass already moved without committing are recorded as they are.
//! 2. Park the user's local edits in the [`StashSlot`].
//! 3. For each drifted module: rebuild its tracking branch, import it, record
//!    it in the [`ChangeSet`] if the import changed anything, and park the
//!    result.
//! 4. Restore every parked entry, newest first.
//! 5. Optionally commit the touched paths plus the manifest, and nothing
//!    else the index holds, in one commit.
//!
//! A failure stops the pass. The module being imported is rolled back to
//! `HEAD`, parked entries are restored, and the error is returned. Modules
//! reconciled before the failure keep their new state and tracking branch;
//! running the pass again records them without importing them twice.

use serde::Serialize;

use crate::changes::{ChangeSet, ModuleChange};
use crate::error::{Error, Result};
use crate::import::{import_full, import_merge};
use crate::inspect;
use crate::manifest::Manifest;
use crate::output::Reporter;
use crate::repository::Repository;
use crate::retry::RetryPolicy;
use crate::stash::StashSlot;
use crate::tracking::{self, short};

/// How a pass treats modules that were imported before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Re-import every module from scratch, ignoring existing tracking state.
    Init,
    /// Act only on modules whose pin drifted, merging into existing trees.
    Sync,
}

impl Mode {
    /// Subject line of the commit a pass in this mode creates.
    pub fn commit_subject(&self) -> &'static str {
        match self {
            Mode::Init => "Import vendored modules",
            Mode::Sync => "Sync vendored modules",
        }
    }
}

/// Options for one reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub mode: Mode,
    /// Create one commit recording every changed module.
    pub commit: bool,
    /// Manifest path relative to the repository root; staged with the commit.
    pub manifest_path: String,
}

/// Outcome of a pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub base_branch: String,
    pub changes: ChangeSet,
    /// The commit created by the pass, if any.
    pub commit: Option<String>,
}

/// Runs reconciliation passes against one repository.
pub struct Reconciler<'a> {
    repo: &'a Repository,
    reporter: &'a Reporter,
    fetch_policy: RetryPolicy,
}

impl<'a> Reconciler<'a> {
    pub fn new(repo: &'a Repository, reporter: &'a Reporter, fetch_policy: RetryPolicy) -> Self {
        Self {
            repo,
            reporter,
            fetch_policy,
        }
    }

    /// Run one pass converging the repository on `manifest`.
    pub fn run(&self, manifest: &Manifest, options: &ReconcileOptions) -> Result<ReconcileReport> {
        let base_branch = inspect::current_branch(self.repo)?;
        let observed = inspect::observe(self.repo, &base_branch, manifest, &options.manifest_path)?;
        let carried =
            inspect::uncommitted_progress(self.repo, manifest, &observed, &options.manifest_path)?;
        for change in &carried {
            self.reporter.info(&format!(
                "Module {} was already moved by an earlier pass",
                change.module
            ));
        }

        let pending = match options.mode {
            Mode::Sync => inspect::declared_vs_actual(manifest, &observed),
            Mode::Init => observed
                .into_iter()
                .filter(|state| carried.get(&state.module_name).is_none())
                .map(|state| ModuleChange {
                    module: state.module_name,
                    previous: state.current_commit,
                    current: None,
                })
                .fold(ChangeSet::new(), |mut set, change| {
                    set.push(change);
                    set
                }),
        };

        if pending.is_empty() && carried.is_empty() {
            self.reporter.info("All modules are up to date");
            return Ok(ReconcileReport {
                base_branch,
                changes: ChangeSet::new(),
                commit: None,
            });
        }

        let mut changes = if pending.is_empty() {
            ChangeSet::new()
        } else {
            self.reconcile_parked(&base_branch, manifest, &pending, options.mode)?
        };
        changes.merge_ordered(carried, manifest.names());

        let commit = if options.commit && !changes.is_empty() {
            Some(self.commit(&changes, options)?)
        } else {
            None
        };

        Ok(ReconcileReport {
            base_branch,
            changes,
            commit,
        })
    }

    /// Reconcile `pending` with the user's edits parked for the duration.
    fn reconcile_parked(
        &self,
        base_branch: &str,
        manifest: &Manifest,
        pending: &ChangeSet,
        mode: Mode,
    ) -> Result<ChangeSet> {
        let mut slot = StashSlot::open(self.repo)?;
        slot.park_local_edits(self.repo, self.reporter)?;

        let changes = match self.reconcile_modules(base_branch, manifest, pending, mode, &mut slot) {
            Ok(changes) => changes,
            Err(err) => return Err(self.unwind(&mut slot, err)),
        };

        slot.restore_all(self.repo, self.reporter)?;
        Ok(changes)
    }

    fn reconcile_modules(
        &self,
        base_branch: &str,
        manifest: &Manifest,
        pending: &ChangeSet,
        mode: Mode,
        slot: &mut StashSlot,
    ) -> Result<ChangeSet> {
        let mut changes = ChangeSet::new();

        for change in pending {
            let module = change.module.as_str();
            let spec = manifest.get(module).ok_or_else(|| Error::UnknownModule {
                name: module.to_string(),
            })?;
            self.reporter.info(&format!("Reconciling module {}", module));

            let commit = tracking::ensure(
                self.repo,
                base_branch,
                module,
                spec,
                &self.fetch_policy,
                self.reporter,
            )?;

            if mode == Mode::Sync && inspect::module_in_head(self.repo, module)? {
                import_merge(
                    self.repo,
                    base_branch,
                    module,
                    change.previous.as_deref(),
                    self.reporter,
                )?;
            } else {
                import_full(self.repo, base_branch, module)?;
            }

            if inspect::has_staged_changes(self.repo, module)? {
                self.reporter.info(&format!(
                    "Module {} moved to {}",
                    module,
                    short(&commit)
                ));
                changes.push(ModuleChange {
                    module: module.to_string(),
                    previous: change.previous.clone(),
                    current: Some(commit),
                });
            } else {
                self.reporter
                    .info(&format!("Module {} already matches {}", module, short(&commit)));
            }

            slot.park(self.repo, module)?;
        }

        Ok(changes)
    }

    /// Undo the half-imported module and bring parked entries back.
    fn unwind(&self, slot: &mut StashSlot, err: Error) -> Error {
        // Without commits the index holds every finished module
        if slot.is_enabled() {
            if let Err(reset_err) = self.repo.git(&["reset", "--quiet", "--hard", "HEAD"]) {
                self.reporter
                    .warn(&format!("Could not roll back the working tree: {}", reset_err));
            }
        }

        match slot.restore_all(self.repo, self.reporter) {
            Ok(()) => err,
            Err(Error::StashRestore {
                stash,
                stdout,
                stderr,
                ..
            }) => Error::StashRestore {
                stash,
                stdout,
                stderr,
                cause: Some(err.to_string()),
            },
            Err(restore_err) => {
                self.reporter
                    .warn(&format!("Could not restore stashed changes: {}", restore_err));
                err
            }
        }
    }

    /// Commit exactly the touched paths; anything else the user staged stays
    /// staged.
    fn commit(&self, changes: &ChangeSet, options: &ReconcileOptions) -> Result<String> {
        let paths: Vec<&str> = changes
            .modules()
            .chain(std::iter::once(options.manifest_path.as_str()))
            .collect();

        let mut add = vec!["add", "--"];
        add.extend(&paths);
        self.repo.git(&add)?;

        let message = changes.commit_message(options.mode.commit_subject());
        let mut commit = vec!["commit", "--quiet", "--message", message.as_str(), "--"];
        commit.extend(&paths);
        self.repo.git(&commit)?;

        let head = self.repo.git(&["rev-parse", "HEAD"])?;
        let commit = head.stdout_trimmed().to_string();
        self.reporter
            .info(&format!("Committed {} module(s) as {}", changes.len(), short(&commit)));
        Ok(commit)
    }
}
