//! # Tree Importer
//!
//! Brings a module's tracking branch into the base branch's working tree and
//! index without committing.
//!
//! [`import_full`] grafts the tracking branch's tree at the module path with a
//! prefixed `read-tree`, replacing whatever was there. [`import_merge`] merges
//! the tracking branch into an already imported module with a subtree-aware
//! three-way merge, so local modifications inside the module survive
//! upstream updates that do not touch them.
//!
//! Both expect the working tree to be clean on entry; the caller parks any
//! local edits first.

use crate::defaults::tracking_branch_name;
use crate::error::Result;
use crate::output::Reporter;
use crate::repository::Repository;

/// Replace the module path with the tree of its tracking branch.
pub fn import_full(repo: &Repository, base_branch: &str, module: &str) -> Result<()> {
    let tracking = tracking_branch_name(base_branch, module);

    // Both fail harmlessly when the path is new or the repository has no commits
    repo.git_unchecked(&["reset", "--quiet", "HEAD", "--", module])?;
    repo.git_unchecked(&["checkout", "--", module])?;

    repo.git(&["rm", "-r", "--quiet", "--force", "--ignore-unmatch", "--", module])
        .map_err(|e| e.at_stage(module, "import"))?;
    repo.git(&["clean", "-fdxq", "--", module])
        .map_err(|e| e.at_stage(module, "import"))?;

    let prefix = format!("--prefix={}/", module);
    repo.git(&["read-tree", &prefix, "-u", &tracking])
        .map_err(|e| e.at_stage(module, "import"))?;
    Ok(())
}

/// Merge the tracking branch into the already imported module path.
///
/// `previous` is the upstream commit the module was last imported at and
/// serves as the merge base. Without it, or when that commit is no longer
/// in the object store, the module is re-imported with [`import_full`].
pub fn import_merge(
    repo: &Repository,
    base_branch: &str,
    module: &str,
    previous: Option<&str>,
    reporter: &Reporter,
) -> Result<()> {
    let base = match previous {
        Some(commit) if commit_exists(repo, commit)? => commit,
        _ => {
            reporter.warn(&format!(
                "No merge base for module {}; replacing it with the upstream tree",
                module
            ));
            return import_full(repo, base_branch, module);
        }
    };

    let tracking = tracking_branch_name(base_branch, module);
    let subtree = format!("--subtree={}", module);
    repo.git(&["merge-recursive", &subtree, base, "--", "HEAD", &tracking])
        .map_err(|e| e.at_stage(module, "merge"))?;
    Ok(())
}

fn commit_exists(repo: &Repository, commit: &str) -> Result<bool> {
    let object = format!("{}^{{commit}}", commit);
    Ok(repo.git_unchecked(&["cat-file", "-e", &object])?.success())
}
