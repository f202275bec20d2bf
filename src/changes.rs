//! Change sets: which modules a pass found (or made) different, and the
//! commit message that records them.

use std::fmt::Write as _;

use serde::Serialize;

/// One module whose declared pin differs from what the repository holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleChange {
    pub module: String,
    /// Commit the module was at before the pass; `None` when unknown or the
    /// module was never imported.
    pub previous: Option<String>,
    /// Commit the module was moved to. Filled in once the pin is resolved.
    pub current: Option<String>,
}

/// Ordered list of module changes, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    changes: Vec<ModuleChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: ModuleChange) {
        self.changes.push(change);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleChange> {
        self.changes.iter()
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|change| change.module.as_str())
    }

    pub fn get(&self, module: &str) -> Option<&ModuleChange> {
        self.changes.iter().find(|change| change.module == module)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Fold `other` in, keeping modules in the order `names` lists them.
    pub fn merge_ordered<'a>(&mut self, other: ChangeSet, names: impl IntoIterator<Item = &'a str>) {
        let names: Vec<&str> = names.into_iter().collect();
        self.changes.extend(other.changes);
        self.changes.sort_by_key(|change| {
            names
                .iter()
                .position(|name| *name == change.module)
                .unwrap_or(usize::MAX)
        });
    }

    /// Render the message for the commit that records this change set.
    ///
    /// ```text
    /// Sync vendored modules
    ///
    /// apache
    ///  - old commit: 0b6bd7a...
    ///  - new commit: 1f0e3dd...
    /// ```
    pub fn commit_message(&self, subject: &str) -> String {
        let mut message = format!("{}\n\n", subject);
        for change in &self.changes {
            let current = change.current.as_deref().unwrap_or("unknown");
            let _ = writeln!(message, "{}", change.module);
            match &change.previous {
                Some(previous) => {
                    let _ = writeln!(message, " - old commit: {}", previous);
                    let _ = writeln!(message, " - new commit: {}", current);
                }
                None => {
                    let _ = writeln!(message, " - initial commit: {}", current);
                }
            }
            message.push('\n');
        }
        message
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ModuleChange;
    type IntoIter = std::slice::Iter<'a, ModuleChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}
