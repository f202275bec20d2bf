//! # Cleanup
//!
//! Deletes tracking branches, and the remotes registered under the same
//! names, once a base branch's modules are reconciled for good. Cleanup is
//! best effort: a branch that cannot be deleted is reported and the rest of
//! the list is still processed.

use log::debug;

use crate::defaults::tracking_branch_name;
use crate::error::Result;
use crate::inspect;
use crate::output::Reporter;
use crate::repository::Repository;

/// What a cleanup run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupSummary {
    pub removed: Vec<String>,
    pub missed: Vec<String>,
}

/// Delete the tracking branch of every module in `modules` on `base_branch`.
///
/// When one of those branches is checked out, `base_branch` is checked out
/// first. Each failed deletion is reported as a warning.
pub fn remove_tracking_branches<S: AsRef<str>>(
    repo: &Repository,
    base_branch: &str,
    modules: &[S],
    reporter: &Reporter,
) -> Result<CleanupSummary> {
    let branches: Vec<String> = modules
        .iter()
        .map(|module| tracking_branch_name(base_branch, module.as_ref()))
        .collect();

    if let Ok(current) = inspect::current_branch(repo) {
        if branches.contains(&current) {
            reporter.info(&format!("Switching from {} to {}", current, base_branch));
            repo.git(&["checkout", "--quiet", base_branch])?;
        }
    }

    let mut summary = CleanupSummary::default();
    for branch in branches {
        let output = repo.git_unchecked(&["branch", "-D", &branch])?;
        if output.success() {
            reporter.info(&format!("Deleted tracking branch {}", branch));
            summary.removed.push(branch);
        } else {
            reporter.warn(&format!(
                "Failed to remove tracking branch {}: {}",
                branch,
                output.stderr.trim()
            ));
            summary.missed.push(branch);
        }
    }
    Ok(summary)
}

/// Remove the remote registered for every module in `modules` on
/// `base_branch`. Remotes that do not exist are skipped.
pub fn remove_tracking_remotes<S: AsRef<str>>(
    repo: &Repository,
    base_branch: &str,
    modules: &[S],
) -> Result<usize> {
    let mut removed = 0;
    for module in modules {
        let remote = tracking_branch_name(base_branch, module.as_ref());
        if repo.git_unchecked(&["remote", "remove", &remote])?.success() {
            removed += 1;
        } else {
            debug!("No remote {} to remove", remote);
        }
    }
    Ok(removed)
}
