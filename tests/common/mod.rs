//! Shared test utilities for integration and E2E tests.
//!
//! This module provides fixtures that build throwaway git repositories: a
//! host repository modules are vendored into, and any number of upstream
//! repositories with known commits.
//!
//! ## Usage
//!
//! Add `#[macro_use] mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! #[macro_use]
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     require_git!();
//!     let fixture = TestFixture::new();
//!     let ntp = fixture.upstream("ntp");
//!     let c1 = ntp.commit(&[("init.pp", "class ntp {}\n")], "Initial");
//!     fixture.write_manifest(&[("ntp", &ntp, &c1)]);
//!     // ... test code
//! }
//! ```

#![allow(dead_code)]

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::git_available;
    #[allow(unused_imports)]
    pub use super::{TestFixture, Upstream};
}

/// Skip the current test when no `git` binary is on `PATH`.
macro_rules! require_git {
    () => {
        if !$crate::common::git_available() {
            eprintln!("git not available, skipping test");
            return;
        }
    };
}

/// Whether a usable `git` binary is on `PATH`.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Run git in `dir`, panicking on failure. Returns trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {} failed in {}:\n{}",
        args.join(" "),
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initialize a repository on branch `main` with a local identity.
fn init_repo(dir: &Path) {
    std::fs::create_dir_all(dir).expect("Failed to create repository directory");
    git(dir, &["init", "--quiet"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(dir, &["config", "user.name", "Subvend Tests"]);
    git(dir, &["config", "user.email", "tests@subvend.invalid"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

/// An upstream repository a module is vendored from.
pub struct Upstream {
    path: PathBuf,
}

impl Upstream {
    /// Source string to put in the manifest.
    pub fn source(&self) -> String {
        self.path.display().to_string()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `files` and commit them. Returns the new commit id.
    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> String {
        for (name, content) in files {
            let file = self.path.join(name);
            if let Some(parent) = file.parent() {
                std::fs::create_dir_all(parent).expect("Failed to create upstream directory");
            }
            std::fs::write(file, content).expect("Failed to write upstream file");
        }
        git(&self.path, &["add", "--all"]);
        git(&self.path, &["commit", "--quiet", "-m", message]);
        git(&self.path, &["rev-parse", "HEAD"])
    }

    /// Tag the current commit.
    pub fn tag(&self, name: &str) {
        git(&self.path, &["tag", name]);
    }
}

/// A temporary directory holding a host repository at `host/` and upstream
/// repositories under `upstream/`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// A host repository with one commit containing `README.md`.
    pub fn new() -> Self {
        let fixture = Self::empty();
        fixture.write("README.md", "# Host\n");
        fixture.git(&["add", "README.md"]);
        fixture.git(&["commit", "--quiet", "-m", "Initial commit"]);
        fixture
    }

    /// A host repository without any commit.
    pub fn empty() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        init_repo(&temp_dir.path().join("host"));
        Self { temp_dir }
    }

    /// Create an empty upstream repository called `name`.
    pub fn upstream(&self, name: &str) -> Upstream {
        let path = self.temp_dir.path().join("upstream").join(name);
        init_repo(&path);
        Upstream { path }
    }

    /// Path of the host repository.
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().join("host")
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child("host").child(path)
    }

    /// Write a file in the host working tree.
    pub fn write(&self, path: &str, content: &str) {
        self.child(path)
            .write_str(content)
            .expect("Failed to write file");
    }

    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    /// Write a `Vendorfile` pinning each `(name, upstream, commit)`.
    pub fn write_manifest(&self, modules: &[(&str, &Upstream, &str)]) {
        let sections: Vec<String> = modules
            .iter()
            .map(|(name, upstream, commit)| {
                format!(
                    "[{}]\nsource = {}\ncommit = {}\n",
                    name,
                    upstream.source(),
                    commit
                )
            })
            .collect();
        self.write("Vendorfile", &sections.join("\n"));
    }

    /// Run git in the host repository.
    pub fn git(&self, args: &[&str]) -> String {
        git(&self.path(), args)
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    /// Full message of the `HEAD` commit.
    pub fn head_message(&self) -> String {
        self.git(&["log", "-1", "--format=%B"])
    }

    /// Paths changed by the `HEAD` commit.
    pub fn head_paths(&self) -> Vec<String> {
        self.git(&["show", "--name-only", "--format=", "HEAD"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Local branch names.
    pub fn branches(&self) -> Vec<String> {
        self.git(&["branch", "--format=%(refname:short)"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn stash_count(&self) -> usize {
        self.git(&["stash", "list"]).lines().count()
    }

    /// Create a command for the subvend binary running in the host repository.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("subvend");
        cmd.current_dir(self.path())
            .env("NO_COLOR", "1")
            .env("SUBVEND_RATE_LIMIT_DELAY", "0")
            .env_remove("SUBVEND_MANIFEST")
            .env_remove("SUBVEND_FETCH_ATTEMPTS")
            .env_remove("SUBVEND_GIT");
        cmd
    }
}
