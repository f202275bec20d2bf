//! Default values for subvend.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::time::Duration;

/// Name of the manifest file, relative to the repository root.
pub const DEFAULT_MANIFEST_FILENAME: &str = "Vendorfile";

/// The git executable used when none is configured.
pub const DEFAULT_GIT_PROGRAM: &str = "git";

/// How many times a module's upstream is fetched before giving up.
pub const DEFAULT_FETCH_ATTEMPTS: u32 = 3;

/// Pause before retrying a fetch the remote rate-limited.
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(5);

/// Prefix of every stash message subvend creates.
pub const STASH_MESSAGE_PREFIX: &str = "subvend:";

/// Name of the tracking branch (and remote) for a module on a base branch.
///
/// For base branch `main` and module `apache` this is `main-apache`.
pub fn tracking_branch_name(base_branch: &str, module: &str) -> String {
    format!("{}-{}", base_branch, module)
}
