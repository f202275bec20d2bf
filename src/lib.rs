//! # subvend
//!
//! Keeps third-party source trees ("modules") vendored inside a host git
//! repository, each pinned to an upstream commit or ref, and converges the
//! repository on those pins with as few git operations as possible. It is
//! designed to be used by the `subvend` command-line tool but works as a
//! library too.
//!
//! ## Quick Example
//!
//! ```
//! use subvend::manifest::{Manifest, ModuleSpec, PinKind};
//!
//! let mut manifest = Manifest::parse(
//!     "[ntp]\nsource = https://github.com/puppetlabs/puppetlabs-ntp.git\nref = v6.0.0\n",
//! )
//! .unwrap();
//! manifest
//!     .insert("stdlib", ModuleSpec::commit("https://example.com/stdlib.git", "0123abc"))
//!     .unwrap();
//!
//! assert_eq!(manifest.names().collect::<Vec<_>>(), vec!["ntp", "stdlib"]);
//! assert_eq!(manifest.get("ntp").unwrap().pin_kind, PinKind::Ref);
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifest (`manifest`)**: the `Vendorfile` declaring each module's
//!   source and pin.
//! - **Tracking branches (`tracking`)**: a private branch per module and base
//!   branch holding the upstream history at the pinned commit.
//! - **Import (`import`)**: grafts or merges a tracking branch's tree into
//!   the module's directory, without committing.
//! - **Reconciliation (`reconcile`)**: drives a whole pass, parking local
//!   edits in the stash (`stash`) and finishing with one commit.
//! - **Cleanup (`cleanup`)**: removes tracking branches that are no longer
//!   needed.
//!
//! Every git invocation goes through the [`git::GitExecutor`] held by a
//! [`repository::Repository`].

pub mod changes;
pub mod cleanup;
pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod import;
pub mod inspect;
pub mod manifest;
pub mod output;
pub mod reconcile;
pub mod repository;
pub mod retry;
pub mod stash;
pub mod suggestions;
pub mod tracking;
