//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Following CLI recommendations,
//! errors should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use subvend::suggestions;
//!
//! // Errors raised by the CLI itself come with hints built in:
//! return Err(suggestions::module_exists("ntp"));
//!
//! // Library errors get their hints attached when they are printed:
//! for hint in suggestions::hints_for(&err) {
//!     eprintln!("hint: {hint}");
//! }
//! ```

use crate::error::Error;

/// Hints for a library error, most useful first. Empty when there is
/// nothing to add to the error message itself.
pub fn hints_for(error: &Error) -> Vec<String> {
    match error {
        Error::ManifestNotFound { .. } => vec![
            "Run 'subvend add <SOURCE> --commit <HASH>' to create one".to_string(),
            "Use --manifest or SUBVEND_MANIFEST to point at another file".to_string(),
        ],
        Error::RepositoryState { .. } => vec![
            "Check out the branch the modules should be vendored into, then run again"
                .to_string(),
        ],
        Error::Fetch { .. } => vec![
            "Check network access and credentials for the module's source".to_string(),
            "Raise --fetch-attempts (or SUBVEND_FETCH_ATTEMPTS) for flaky remotes".to_string(),
        ],
        Error::StashRestore { .. } => vec![
            "Your changes are still stashed: see 'git stash list' and 'git stash show -p'"
                .to_string(),
            "Resolve the conflict, then apply and drop the entry by hand".to_string(),
        ],
        Error::Reconciliation { stage, .. } if stage == "merge" => vec![
            "Local modifications inside the module conflict with the upstream update"
                .to_string(),
            "Commit or revert them, or run 'subvend init' to replace the module tree"
                .to_string(),
        ],
        Error::Spawn { .. } => vec![
            "Install git, or point --git (or SUBVEND_GIT) at the executable".to_string(),
        ],
        Error::ManifestParse { .. } => vec![
            "Each [module] section needs 'source' and exactly one of 'commit' or 'ref'"
                .to_string(),
        ],
        _ => Vec::new(),
    }
}

/// Generate an error for adding a module that is already declared.
pub fn module_exists(name: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Module '{name}' is already declared in the manifest\n\n\
         hint: Use --force to replace its source and pin\n\
         hint: Use --name to add the source under another name"
    )
}

/// Generate an error for a source whose module name cannot be derived.
pub fn module_name_required(source: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Cannot derive a module name from source: {source}\n\n\
         hint: Use --name to choose the module's name"
    )
}

/// Generate an error for an unknown module name.
///
/// Suggests a declared module with a similar name.
pub fn unknown_module(name: &str, declared: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(name, declared)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown module: {name}{did_you_mean}\n\n\
         Declared modules are: {modules}",
        modules = if declared.is_empty() {
            "(none)".to_string()
        } else {
            declared.join(", ")
        }
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0usize; b_len + 1];

    for i in 1..=a_len {
        current[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_len]
}
