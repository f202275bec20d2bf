//! Integration tests driving the reconciliation engine against real git
//! repositories.
//!
//! Every test builds a throwaway host repository plus local upstream
//! repositories, so no network access is needed. Tests skip themselves when
//! no `git` binary is available.

#[macro_use]
mod common;

use std::time::Duration;

use common::{TestFixture, Upstream};
use subvend::cleanup;
use subvend::error::Error;
use subvend::manifest::{Manifest, ModuleSpec};
use subvend::output::Reporter;
use subvend::reconcile::{Mode, ReconcileOptions, ReconcileReport, Reconciler};
use subvend::repository::Repository;
use subvend::retry::RetryPolicy;

fn options(mode: Mode, commit: bool) -> ReconcileOptions {
    ReconcileOptions {
        mode,
        commit,
        manifest_path: "Vendorfile".to_string(),
    }
}

fn reconcile(fixture: &TestFixture, mode: Mode, commit: bool) -> subvend::error::Result<ReconcileReport> {
    let repo = Repository::new(fixture.path());
    let manifest = Manifest::load(&fixture.path().join("Vendorfile"))?;
    let reporter = Reporter::quiet();
    Reconciler::new(&repo, &reporter, RetryPolicy::new(3, Duration::ZERO))
        .run(&manifest, &options(mode, commit))
}

/// Repin `module` in the host's manifest.
fn repin(fixture: &TestFixture, module: &str, upstream: &Upstream, commit: &str) {
    let path = fixture.path().join("Vendorfile");
    let mut manifest = Manifest::load(&path).unwrap();
    manifest
        .insert(module, ModuleSpec::commit(upstream.source(), commit))
        .unwrap();
    manifest.save(&path).unwrap();
}

/// Host with modules `a` (at `a1`) and `b` (at `b1`) imported and committed.
struct Imported {
    fixture: TestFixture,
    a: Upstream,
    a1: String,
    b: Upstream,
    b1: String,
}

fn imported() -> Imported {
    let fixture = TestFixture::new();
    let a = fixture.upstream("a");
    let b = fixture.upstream("b");
    let a1 = a.commit(
        &[("manifests/init.pp", "class a {\n  $port = 80\n}\n"), ("README", "module a\n")],
        "a1",
    );
    let b1 = b.commit(&[("lib/b.rb", "module B; end\n")], "b1");
    fixture.write_manifest(&[("a", &a, &a1), ("b", &b, &b1)]);

    reconcile(&fixture, Mode::Init, true).unwrap();
    Imported {
        fixture,
        a,
        a1,
        b,
        b1,
    }
}

#[test]
fn test_init_imports_every_module_in_one_commit() {
    require_git!();
    let fixture = TestFixture::new();
    let a = fixture.upstream("a");
    let b = fixture.upstream("b");
    let a1 = a.commit(&[("init.pp", "class a {}\n")], "a1");
    let b1 = b.commit(&[("lib/b.rb", "module B; end\n")], "b1");
    fixture.write_manifest(&[("a", &a, &a1), ("b", &b, &b1)]);
    let before = fixture.head();

    let report = reconcile(&fixture, Mode::Init, true).unwrap();

    assert_eq!(report.base_branch, "main");
    assert_eq!(report.changes.modules().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(fixture.read("a/init.pp"), "class a {}\n");
    assert_eq!(fixture.read("b/lib/b.rb"), "module B; end\n");

    let head = fixture.head();
    assert_eq!(report.commit.as_deref(), Some(head.as_str()));
    assert_eq!(fixture.git(&["rev-parse", "HEAD~1"]), before);

    let message = fixture.head_message();
    assert!(message.starts_with("Import vendored modules"));
    assert!(message.contains(&format!("a\n - initial commit: {a1}")));
    assert!(message.contains(&format!("b\n - initial commit: {b1}")));
    assert!(fixture.git(&["status", "--porcelain"]).is_empty());
}

#[test]
fn test_sync_touches_only_the_repinned_module() {
    require_git!();
    let Imported {
        fixture, a, a1, ..
    } = imported();
    let a2 = a.commit(&[("manifests/init.pp", "class a {\n  $port = 8080\n}\n")], "a2");
    repin(&fixture, "a", &a, &a2);

    let report = reconcile(&fixture, Mode::Sync, true).unwrap();

    assert_eq!(report.changes.modules().collect::<Vec<_>>(), vec!["a"]);
    let change = report.changes.get("a").unwrap();
    assert_eq!(change.previous.as_deref(), Some(a1.as_str()));
    assert_eq!(change.current.as_deref(), Some(a2.as_str()));

    assert!(fixture.read("a/manifests/init.pp").contains("8080"));
    let mut paths = fixture.head_paths();
    paths.sort();
    assert_eq!(paths, vec!["Vendorfile", "a/manifests/init.pp"]);

    let message = fixture.head_message();
    assert!(message.starts_with("Sync vendored modules"));
    assert!(message.contains(&format!(" - old commit: {a1}")));
    assert!(message.contains(&format!(" - new commit: {a2}")));
    assert!(!message.contains("\nb\n"));
}

#[test]
fn test_second_pass_is_a_no_op() {
    require_git!();
    let Imported { fixture, .. } = imported();
    let head = fixture.head();

    let report = reconcile(&fixture, Mode::Sync, true).unwrap();
    assert!(report.changes.is_empty());
    assert!(report.commit.is_none());

    let report = reconcile(&fixture, Mode::Init, true).unwrap();
    assert!(report.changes.is_empty());
    assert!(report.commit.is_none());

    assert_eq!(fixture.head(), head);
    assert!(fixture.git(&["status", "--porcelain"]).is_empty());
}

#[test]
fn test_local_edits_survive_a_successful_pass() {
    require_git!();
    let Imported {
        fixture, a, ..
    } = imported();
    let a2 = a.commit(&[("README", "module a, second release\n")], "a2");
    repin(&fixture, "a", &a, &a2);
    fixture.git(&["add", "Vendorfile"]);
    fixture.git(&["commit", "--quiet", "-m", "Repin a"]);
    fixture.write("README.md", "# Host\n\nwork in progress\n");

    let report = reconcile(&fixture, Mode::Sync, true).unwrap();

    assert_eq!(report.changes.len(), 1);
    assert_eq!(fixture.read("README.md"), "# Host\n\nwork in progress\n");
    assert_eq!(fixture.stash_count(), 0);
    assert_eq!(fixture.git(&["status", "--porcelain"]), "M README.md");
    assert!(!fixture.head_paths().contains(&"README.md".to_string()));
}

#[test]
fn test_commit_leaves_other_staged_files_alone() {
    require_git!();
    let Imported { fixture, a, .. } = imported();
    let a2 = a.commit(&[("README", "module a, second release\n")], "a2");
    repin(&fixture, "a", &a, &a2);
    fixture.write("notes.txt", "draft\n");
    fixture.write("README.md", "# Host\n\nstaged edit\n");
    fixture.git(&["add", "notes.txt", "README.md"]);

    let report = reconcile(&fixture, Mode::Sync, true).unwrap();

    assert!(report.commit.is_some());
    let mut paths = fixture.head_paths();
    paths.sort();
    assert_eq!(paths, vec!["Vendorfile", "a/README"]);
    assert_eq!(
        fixture.git(&["diff", "--cached", "--name-only"]),
        "README.md\nnotes.txt"
    );
    assert_eq!(fixture.read("notes.txt"), "draft\n");
    assert_eq!(fixture.stash_count(), 0);
}

/// Repin `a` to a new release and `b` to a commit its upstream lacks, then
/// run a pass that finishes `a` and fails on `b`.
fn fail_part_way(imported: &Imported) -> String {
    let Imported { fixture, a, b, .. } = imported;
    let a2 = a.commit(&[("manifests/init.pp", "class a {\n  $port = 8080\n}\n")], "a2");
    repin(fixture, "a", a, &a2);
    repin(fixture, "b", b, "0123456789abcdef0123456789abcdef01234567");
    let head = fixture.head();

    match reconcile(fixture, Mode::Sync, true).unwrap_err() {
        Error::Reconciliation { module, stage, .. } => {
            assert_eq!(module, "b");
            assert_eq!(stage, "branch");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fixture.head(), head);
    assert!(fixture.read("a/manifests/init.pp").contains("8080"));
    a2
}

#[test]
fn test_sync_after_failure_commits_module_finished_earlier() {
    require_git!();
    let imported = imported();
    let a2 = fail_part_way(&imported);
    let Imported { fixture, a1, b, b1, .. } = imported;

    repin(&fixture, "b", &b, &b1);
    let report = reconcile(&fixture, Mode::Sync, true).unwrap();

    assert_eq!(report.changes.modules().collect::<Vec<_>>(), vec!["a"]);
    let change = report.changes.get("a").unwrap();
    assert_eq!(change.previous.as_deref(), Some(a1.as_str()));
    assert_eq!(change.current.as_deref(), Some(a2.as_str()));
    assert_eq!(report.commit.as_deref(), Some(fixture.head().as_str()));

    let mut paths = fixture.head_paths();
    paths.sort();
    assert_eq!(paths, vec!["Vendorfile", "a/manifests/init.pp"]);
    assert!(fixture.git(&["status", "--porcelain"]).is_empty());
    assert_eq!(fixture.stash_count(), 0);
}

#[test]
fn test_sync_after_failure_imports_fixed_module_with_finished_one() {
    require_git!();
    let imported = imported();
    fail_part_way(&imported);
    let Imported { fixture, b, .. } = imported;

    let b2 = b.commit(&[("lib/b.rb", "module B; VERSION = 2; end\n")], "b2");
    repin(&fixture, "b", &b, &b2);
    let report = reconcile(&fixture, Mode::Sync, true).unwrap();

    assert_eq!(report.changes.modules().collect::<Vec<_>>(), vec!["a", "b"]);
    assert!(fixture.read("b/lib/b.rb").contains("VERSION = 2"));
    let mut paths = fixture.head_paths();
    paths.sort();
    assert_eq!(paths, vec!["Vendorfile", "a/manifests/init.pp", "b/lib/b.rb"]);
    assert!(fixture.git(&["status", "--porcelain"]).is_empty());
    assert_eq!(fixture.stash_count(), 0);
}

#[test]
fn test_local_edits_survive_a_failed_pass() {
    require_git!();
    let Imported { fixture, a, .. } = imported();
    repin(&fixture, "a", &a, "0123456789abcdef0123456789abcdef01234567");
    fixture.write("README.md", "# Host\n\nwork in progress\n");
    let head = fixture.head();

    let err = reconcile(&fixture, Mode::Sync, true).unwrap_err();

    match err {
        Error::Reconciliation { module, stage, .. } => {
            assert_eq!(module, "a");
            assert_eq!(stage, "branch");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fixture.read("README.md"), "# Host\n\nwork in progress\n");
    assert_eq!(fixture.stash_count(), 0);
    assert_eq!(fixture.head(), head);
}

#[test]
fn test_unreachable_source_fails_after_retries() {
    require_git!();
    let Imported { fixture, b1, .. } = imported();
    let missing = fixture.path().join("../upstream/missing");
    let mut manifest = Manifest::load(&fixture.path().join("Vendorfile")).unwrap();
    manifest
        .insert("c", ModuleSpec::commit(missing.display().to_string(), &b1))
        .unwrap();
    manifest.save(&fixture.path().join("Vendorfile")).unwrap();
    fixture.write("README.md", "# Host\n\nedited\n");

    let err = reconcile(&fixture, Mode::Sync, false).unwrap_err();

    match err {
        Error::Fetch {
            module, attempts, ..
        } => {
            assert_eq!(module, "c");
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fixture.read("README.md"), "# Host\n\nedited\n");
    assert_eq!(fixture.stash_count(), 0);
}

#[test]
fn test_local_patch_inside_module_survives_upstream_update() {
    require_git!();
    let Imported {
        fixture, a, ..
    } = imported();
    fixture.write("a/README", "module a (patched locally)\n");
    fixture.git(&["commit", "--quiet", "-am", "Patch module a"]);

    let a2 = a.commit(&[("manifests/init.pp", "class a {\n  $port = 443\n}\n")], "a2");
    repin(&fixture, "a", &a, &a2);

    reconcile(&fixture, Mode::Sync, true).unwrap();

    assert_eq!(fixture.read("a/README"), "module a (patched locally)\n");
    assert!(fixture.read("a/manifests/init.pp").contains("443"));
}

#[test]
fn test_cleanup_tolerates_missing_branches() {
    require_git!();
    let Imported { fixture, .. } = imported();
    assert!(fixture.branches().contains(&"main-a".to_string()));
    fixture.git(&["branch", "-D", "main-a"]);

    let repo = Repository::new(fixture.path());
    let summary =
        cleanup::remove_tracking_branches(&repo, "main", &["a", "b"], &Reporter::quiet()).unwrap();

    assert_eq!(summary.removed, vec!["main-b"]);
    assert_eq!(summary.missed, vec!["main-a"]);
    assert_eq!(fixture.branches(), vec!["main"]);
}

#[test]
fn test_cleanup_switches_off_checked_out_tracking_branch() {
    require_git!();
    let Imported { fixture, .. } = imported();
    fixture.git(&["checkout", "--quiet", "main-b"]);

    let repo = Repository::new(fixture.path());
    let summary =
        cleanup::remove_tracking_branches(&repo, "main", &["a", "b"], &Reporter::quiet()).unwrap();

    assert_eq!(summary.removed.len(), 2);
    assert_eq!(fixture.git(&["symbolic-ref", "--short", "HEAD"]), "main");
}

#[test]
fn test_pass_after_cleanup_is_a_no_op() {
    require_git!();
    let Imported { fixture, .. } = imported();
    let repo = Repository::new(fixture.path());
    cleanup::remove_tracking_branches(&repo, "main", &["a", "b"], &Reporter::quiet()).unwrap();
    cleanup::remove_tracking_remotes(&repo, "main", &["a", "b"]).unwrap();
    let head = fixture.head();

    let report = reconcile(&fixture, Mode::Sync, true).unwrap();

    assert!(report.changes.is_empty());
    assert_eq!(fixture.head(), head);
    assert!(fixture.branches().iter().all(|branch| branch == "main"));
}

#[test]
fn test_sync_after_cleanup_merges_from_committed_pin() {
    require_git!();
    let Imported {
        fixture, a, a1, ..
    } = imported();
    let repo = Repository::new(fixture.path());
    cleanup::remove_tracking_branches(&repo, "main", &["a", "b"], &Reporter::quiet()).unwrap();

    let a2 = a.commit(&[("README", "module a, second release\n")], "a2");
    repin(&fixture, "a", &a, &a2);
    let report = reconcile(&fixture, Mode::Sync, true).unwrap();

    let change = report.changes.get("a").unwrap();
    assert_eq!(change.previous.as_deref(), Some(a1.as_str()));
    assert_eq!(fixture.read("a/README"), "module a, second release\n");
}

#[test]
fn test_ref_pin_follows_upstream_branch() {
    require_git!();
    let fixture = TestFixture::new();
    let c = fixture.upstream("c");
    c.commit(&[("VERSION", "1\n")], "c1");
    fixture.write(
        "Vendorfile",
        &format!("[c]\nsource = {}\nref = main\n", c.source()),
    );

    let report = reconcile(&fixture, Mode::Init, true).unwrap();
    assert_eq!(report.changes.len(), 1);

    // Nothing moved upstream
    let report = reconcile(&fixture, Mode::Sync, true).unwrap();
    assert!(report.changes.is_empty());

    let c2 = c.commit(&[("VERSION", "2\n")], "c2");
    let report = reconcile(&fixture, Mode::Sync, true).unwrap();
    assert_eq!(report.changes.get("c").unwrap().current.as_deref(), Some(c2.as_str()));
    assert_eq!(fixture.read("c/VERSION"), "2\n");
}

#[test]
fn test_ref_pin_resolves_tags() {
    require_git!();
    let fixture = TestFixture::new();
    let c = fixture.upstream("c");
    let c1 = c.commit(&[("VERSION", "1\n")], "c1");
    c.tag("v1.0.0");
    c.commit(&[("VERSION", "2\n")], "c2");
    fixture.write(
        "Vendorfile",
        &format!("[c]\nsource = {}\nref = v1.0.0\n", c.source()),
    );

    let report = reconcile(&fixture, Mode::Init, false).unwrap();

    assert_eq!(report.changes.get("c").unwrap().current.as_deref(), Some(c1.as_str()));
    assert_eq!(fixture.read("c/VERSION"), "1\n");
    assert!(fixture.git(&["tag", "--list"]).is_empty());
}

#[test]
fn test_init_in_repository_without_commits() {
    require_git!();
    let fixture = TestFixture::empty();
    let a = fixture.upstream("a");
    let a1 = a.commit(&[("init.pp", "class a {}\n")], "a1");
    fixture.write_manifest(&[("a", &a, &a1)]);

    let report = reconcile(&fixture, Mode::Init, true).unwrap();

    assert_eq!(report.changes.len(), 1);
    assert_eq!(fixture.git(&["rev-list", "--count", "HEAD"]), "1");
    let mut paths = fixture.head_paths();
    paths.sort();
    assert_eq!(paths, vec!["Vendorfile", "a/init.pp"]);
}

#[test]
fn test_uncommitted_pass_leaves_changes_in_working_tree() {
    require_git!();
    let Imported { fixture, a, .. } = imported();
    let head = fixture.head();
    let a2 = a.commit(&[("README", "module a, second release\n")], "a2");
    repin(&fixture, "a", &a, &a2);

    let report = reconcile(&fixture, Mode::Sync, false).unwrap();

    assert!(report.commit.is_none());
    assert_eq!(fixture.head(), head);
    assert_eq!(fixture.read("a/README"), "module a, second release\n");
    assert_eq!(fixture.stash_count(), 0);
}

#[test]
fn test_detached_head_is_refused() {
    require_git!();
    let Imported { fixture, .. } = imported();
    let head = fixture.head();
    fixture.git(&["checkout", "--quiet", "--detach", &head]);

    let err = reconcile(&fixture, Mode::Sync, false).unwrap_err();
    assert!(matches!(err, Error::RepositoryState { .. }));
}
