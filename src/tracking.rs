//! # Tracking Branches
//!
//! A tracking branch holds a module's upstream history, checked out at the
//! commit the manifest pins. It is named `<base>-<module>` and is rebuilt
//! from scratch whenever the module needs reconciling, so recreating it from
//! the same pin always yields the same tree.
//!
//! The module's upstream is registered as a remote with the same name. Its
//! branches land in `refs/remotes/<name>/` and its tags in
//! `refs/remotes/<name>/tags/`, so tags of different modules never collide
//! with each other or with the host's own tags.

use log::debug;

use crate::defaults::tracking_branch_name;
use crate::error::{Error, Result};
use crate::inspect;
use crate::manifest::{ModuleSpec, PinKind};
use crate::output::Reporter;
use crate::repository::Repository;
use crate::retry::{is_transient, RetryPolicy};

/// (Re)create the tracking branch for `module` on `base_branch` at the
/// module's pin, fetching its upstream first. Returns the commit the branch
/// was created at.
///
/// Only the fetch is retried. Any other failing step is reported as
/// [`Error::Reconciliation`] naming the stage.
pub fn ensure(
    repo: &Repository,
    base_branch: &str,
    module: &str,
    spec: &ModuleSpec,
    policy: &RetryPolicy,
    reporter: &Reporter,
) -> Result<String> {
    let name = tracking_branch_name(base_branch, module);

    remove_stale_remote(repo, &name)?;
    remove_stale_branch(repo, base_branch, module, &name)?;

    repo.git(&["remote", "add", &name, &spec.source])
        .map_err(|e| e.at_stage(module, "remote"))?;

    fetch(repo, module, &name, policy, reporter)?;

    let commit = resolve_pin(repo, module, &name, spec)?;
    repo.git(&["branch", "--no-track", &name, &commit])
        .map_err(|e| e.at_stage(module, "branch"))?;

    reporter.info(&format!(
        "Tracking branch {} created at {}",
        name,
        short(&commit)
    ));
    Ok(commit)
}

fn remove_stale_remote(repo: &Repository, name: &str) -> Result<()> {
    let output = repo.git_unchecked(&["remote", "remove", name])?;
    if !output.success() {
        debug!("No stale remote {} to remove", name);
    }
    Ok(())
}

fn remove_stale_branch(repo: &Repository, base_branch: &str, module: &str, name: &str) -> Result<()> {
    if inspect::tracking_branch_commit(repo, base_branch, module)?.is_none() {
        debug!("No stale tracking branch {} to remove", name);
        return Ok(());
    }
    // A checked-out branch cannot be deleted
    if inspect::current_branch(repo).ok().as_deref() == Some(name) {
        repo.git(&["checkout", base_branch])
            .map_err(|e| e.at_stage(module, "checkout"))?;
    }
    repo.git(&["branch", "-D", name])
        .map_err(|e| e.at_stage(module, "branch"))?;
    Ok(())
}

fn fetch(
    repo: &Repository,
    module: &str,
    remote: &str,
    policy: &RetryPolicy,
    reporter: &Reporter,
) -> Result<()> {
    let heads = format!("+refs/heads/*:refs/remotes/{}/*", remote);
    let tags = format!("+refs/tags/*:refs/remotes/{}/tags/*", remote);
    let max_attempts = policy.max_attempts.max(1);

    policy
        .run(
            |attempt| {
                reporter.info(&format!(
                    "Fetching {} (attempt {} of {})",
                    remote, attempt, max_attempts
                ));
                repo.git(&["fetch", "--no-tags", remote, &heads, &tags])
            },
            is_transient,
        )
        .map(|_| ())
        .map_err(|err| match err {
            Error::Execution { stderr, .. } => Error::Fetch {
                module: module.to_string(),
                attempts: max_attempts,
                last_error: stderr.trim().to_string(),
            },
            other => other,
        })
}

/// Resolve the module's pin to a commit available after the fetch.
fn resolve_pin(repo: &Repository, module: &str, remote: &str, spec: &ModuleSpec) -> Result<String> {
    let candidates = match spec.pin_kind {
        PinKind::Commit => vec![spec.pin_value.clone()],
        PinKind::Ref => vec![
            format!("refs/remotes/{}/{}", remote, spec.pin_value),
            format!("refs/remotes/{}/tags/{}", remote, spec.pin_value),
        ],
    };

    for candidate in &candidates {
        if let Some(commit) = inspect::resolve_commit(repo, candidate)? {
            return Ok(commit);
        }
    }

    Err(Error::Reconciliation {
        module: module.to_string(),
        stage: "branch".to_string(),
        stdout: String::new(),
        stderr: format!(
            "{} {} was not found in {}",
            spec.pin_kind, spec.pin_value, spec.source
        ),
    })
}

/// Abbreviate a commit id for messages.
pub fn short(commit: &str) -> &str {
    commit.get(..12).unwrap_or(commit)
}
