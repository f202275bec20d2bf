//! # State Inspector
//!
//! Read-only queries about the host repository that drive reconciliation
//! decisions. Nothing here changes branches, the index or the working tree.

use log::debug;
use serde::Serialize;

use crate::changes::{ChangeSet, ModuleChange};
use crate::defaults::tracking_branch_name;
use crate::error::{Error, Result};
use crate::git::render_command;
use crate::manifest::{Manifest, ModuleSpec, PinKind};
use crate::repository::Repository;

/// Observed state of one module, computed fresh on every pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleState {
    pub module_name: String,
    /// Commit the module currently resolves to, if it was ever materialized.
    pub current_commit: Option<String>,
}

/// How a module's observed state relates to its declared pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Drift {
    /// The observed commit is the pinned commit.
    UpToDate,
    /// The module was imported at another commit.
    Stale,
    /// The module was never imported.
    Absent,
    /// Ref pins are resolved again on every pass.
    Ref,
}

impl Drift {
    pub fn classify(spec: &ModuleSpec, observed: Option<&str>) -> Self {
        match (spec.pin_kind, observed) {
            (PinKind::Ref, _) => Drift::Ref,
            (PinKind::Commit, None) => Drift::Absent,
            (PinKind::Commit, Some(commit)) if same_commit(commit, &spec.pin_value) => {
                Drift::UpToDate
            }
            (PinKind::Commit, Some(_)) => Drift::Stale,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Drift::UpToDate => "up-to-date",
            Drift::Stale => "stale",
            Drift::Absent => "absent",
            Drift::Ref => "ref",
        }
    }
}

impl std::fmt::Display for Drift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the checked-out branch.
///
/// A detached or otherwise unreadable `HEAD` is a [`Error::RepositoryState`].
pub fn current_branch(repo: &Repository) -> Result<String> {
    let output = repo.git_unchecked(&["symbolic-ref", "--quiet", "--short", "HEAD"])?;
    let name = output.stdout_trimmed();
    if !output.success() || name.is_empty() {
        return Err(Error::RepositoryState {
            message: format!(
                "{} has no current branch (detached HEAD or not a git repository)",
                repo.workdir().display()
            ),
        });
    }
    Ok(name.to_string())
}

/// Resolve `rev` to a full commit id, or `None` if it does not name a commit.
pub fn resolve_commit(repo: &Repository, rev: &str) -> Result<Option<String>> {
    let spec = format!("{}^{{commit}}", rev);
    let output = repo.git_unchecked(&["rev-parse", "--verify", "--quiet", &spec])?;
    if output.success() && !output.stdout_trimmed().is_empty() {
        Ok(Some(output.stdout_trimmed().to_string()))
    } else {
        Ok(None)
    }
}

/// Whether `HEAD` points at a commit (false in a freshly initialized repo).
pub fn has_commits(repo: &Repository) -> Result<bool> {
    Ok(resolve_commit(repo, "HEAD")?.is_some())
}

/// Commit the tracking branch of `(base_branch, module)` points at, or
/// `None` when the branch does not exist.
pub fn tracking_branch_commit(
    repo: &Repository,
    base_branch: &str,
    module: &str,
) -> Result<Option<String>> {
    let branch = tracking_branch_name(base_branch, module);
    resolve_commit(repo, &format!("refs/heads/{}", branch))
}

/// Whether the commit at `HEAD` contains the module's directory.
pub fn module_in_head(repo: &Repository, module: &str) -> Result<bool> {
    let spec = format!("HEAD:{}", module);
    Ok(repo
        .git_unchecked(&["rev-parse", "--verify", "--quiet", &spec])?
        .success())
}

/// The manifest as committed at `HEAD`, if there is one and it parses.
pub fn committed_manifest(repo: &Repository, manifest_path: &str) -> Result<Option<Manifest>> {
    let spec = format!("HEAD:{}", manifest_path);
    let output = repo.git_unchecked(&["show", &spec])?;
    if !output.success() {
        return Ok(None);
    }
    match Manifest::parse(&output.stdout) {
        Ok(manifest) => Ok(Some(manifest)),
        Err(err) => {
            debug!("Ignoring unparsable committed manifest: {}", err);
            Ok(None)
        }
    }
}

/// Whether tracked files differ from `HEAD` (untracked files are ignored).
pub fn has_local_changes(repo: &Repository) -> Result<bool> {
    let output = repo.git(&["status", "--porcelain", "--untracked-files=no"])?;
    Ok(!output.stdout_trimmed().is_empty())
}

/// Whether the index differs from `HEAD` under `path`.
pub fn has_staged_changes(repo: &Repository, path: &str) -> Result<bool> {
    diff_quiet(repo, &["diff", "--cached", "--quiet", "--", path])
}

/// Whether the index or the working tree differ from `HEAD` under `path`.
/// Without commits only the index is compared.
pub fn differs_from_head(repo: &Repository, path: &str) -> Result<bool> {
    if has_commits(repo)? {
        diff_quiet(repo, &["diff", "--quiet", "HEAD", "--", path])
    } else {
        has_staged_changes(repo, path)
    }
}

/// Run a `git diff --quiet` variant: exit 1 means a difference, anything
/// above it is a failure.
fn diff_quiet(repo: &Repository, args: &[&str]) -> Result<bool> {
    let output = repo.git_unchecked(args)?;
    match output.status {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(Error::Execution {
            command: render_command("git", args),
            stdout: output.stdout,
            stderr: output.stderr,
        }),
    }
}

/// Observe every module of `manifest`, in manifest order.
///
/// The tracking branch is the primary source. When it is absent but the
/// module was already imported at `HEAD`, the commit pinned in the committed
/// manifest stands in for it.
pub fn observe(
    repo: &Repository,
    base_branch: &str,
    manifest: &Manifest,
    manifest_path: &str,
) -> Result<Vec<ModuleState>> {
    let mut baseline: Option<Option<Manifest>> = None;
    let mut states = Vec::with_capacity(manifest.len());

    for name in manifest.names() {
        let mut current_commit = tracking_branch_commit(repo, base_branch, name)?;

        if current_commit.is_none() && module_in_head(repo, name)? {
            if baseline.is_none() {
                baseline = Some(committed_manifest(repo, manifest_path)?);
            }
            current_commit = baseline
                .as_ref()
                .and_then(Option::as_ref)
                .and_then(|committed| committed.get(name))
                .filter(|spec| spec.pin_kind == PinKind::Commit)
                .map(|spec| spec.pin_value.clone());
        }

        debug!(
            "Module {} observed at {}",
            name,
            current_commit.as_deref().unwrap_or("<absent>")
        );
        states.push(ModuleState {
            module_name: name.to_string(),
            current_commit,
        });
    }
    Ok(states)
}

/// Compare declared pins with observed state.
///
/// Commit pins differ when the observed commit is absent or is a different
/// commit; an abbreviated pin matches the full id it abbreviates. Ref pins
/// always need re-resolution. The result follows manifest order.
pub fn declared_vs_actual(manifest: &Manifest, observed: &[ModuleState]) -> ChangeSet {
    let mut changes = ChangeSet::new();
    for (name, spec) in manifest.iter() {
        let current = observed
            .iter()
            .find(|state| state.module_name == name)
            .and_then(|state| state.current_commit.clone());

        if Drift::classify(spec, current.as_deref()) != Drift::UpToDate {
            changes.push(ModuleChange {
                module: name.to_string(),
                previous: current,
                current: None,
            });
        }
    }
    changes
}

/// Modules an earlier pass moved to their declared commit without committing
/// the result.
///
/// Such a module's tracking branch already sits at its pin, while `HEAD`
/// records another commit (or none) and the module path holds the
/// difference. This is what a pass that stopped part way, or ran without
/// committing, leaves behind. Each one is reported with the committed pin as
/// its previous commit.
pub fn uncommitted_progress(
    repo: &Repository,
    manifest: &Manifest,
    observed: &[ModuleState],
    manifest_path: &str,
) -> Result<ChangeSet> {
    let mut baseline: Option<Option<Manifest>> = None;
    let mut changes = ChangeSet::new();

    for (name, spec) in manifest.iter() {
        let Some(current) = observed
            .iter()
            .find(|state| state.module_name == name)
            .and_then(|state| state.current_commit.as_deref())
        else {
            continue;
        };
        if Drift::classify(spec, Some(current)) != Drift::UpToDate {
            continue;
        }

        if baseline.is_none() {
            baseline = Some(committed_manifest(repo, manifest_path)?);
        }
        let committed = baseline
            .as_ref()
            .and_then(Option::as_ref)
            .and_then(|committed| committed.get(name))
            .filter(|spec| spec.pin_kind == PinKind::Commit)
            .map(|spec| spec.pin_value.clone());
        if committed.as_deref().is_some_and(|pin| same_commit(pin, current)) {
            continue;
        }
        if !differs_from_head(repo, name)? {
            continue;
        }

        debug!("Module {} already moved to {} but is not committed", name, current);
        changes.push(ModuleChange {
            module: name.to_string(),
            previous: committed,
            current: Some(current.to_string()),
        });
    }
    Ok(changes)
}

/// Compare two commit ids, allowing either to be an abbreviation.
pub fn same_commit(a: &str, b: &str) -> bool {
    let a = a.to_ascii_lowercase();
    let b = b.to_ascii_lowercase();
    if a.len() == b.len() {
        return a == b;
    }
    let (short, long) = if a.len() < b.len() { (&a, &b) } else { (&b, &a) };
    short.len() >= 7 && long.starts_with(short.as_str())
}
