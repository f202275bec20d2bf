//! # Module Manifest
//!
//! The manifest declares every vendored module: where its upstream lives and
//! which commit or ref it is pinned to. It is an INI-style file with one
//! section per module:
//!
//! ```text
//! # Web server
//! [apache]
//! source = https://github.com/puppetlabs/puppetlabs-apache.git
//! commit = 0b6bd7a2cd1e4b4f2f5b0c5d0b62e2b4b3e7a5a1
//!
//! [ntp]
//! source = https://github.com/puppetlabs/puppetlabs-ntp.git
//! ref = v6.0.0
//! ```
//!
//! Section order is significant and is never changed: modules are reconciled
//! and reported in file order. Comments, blank lines, key order and unknown
//! keys survive a load/save cycle, so saving an untouched manifest rewrites
//! the same bytes (with `key = value` spacing).

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};

const SOURCE_KEY: &str = "source";
const LEGACY_SOURCE_KEY: &str = "git";

/// What a module's pin refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PinKind {
    /// An immutable commit hash.
    Commit,
    /// A symbolic ref (branch or tag) that is resolved on every pass.
    Ref,
}

impl PinKind {
    /// The manifest key this pin kind is stored under.
    pub fn key(self) -> &'static str {
        match self {
            PinKind::Commit => "commit",
            PinKind::Ref => "ref",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "commit" => Some(PinKind::Commit),
            "ref" => Some(PinKind::Ref),
            _ => None,
        }
    }
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Declared state of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSpec {
    /// URL (or path) of the upstream repository.
    pub source: String,
    pub pin_kind: PinKind,
    /// Commit hash or ref name, depending on `pin_kind`.
    pub pin_value: String,
}

impl ModuleSpec {
    /// A module pinned to a commit hash.
    pub fn commit(source: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            pin_kind: PinKind::Commit,
            pin_value: hash.into(),
        }
    }

    /// A module following a branch or tag.
    pub fn reference(source: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            pin_kind: PinKind::Ref,
            pin_value: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    /// Comment and blank lines directly above the section header.
    leading: Vec<String>,
    /// Key/value pairs in file order, including unknown keys.
    entries: Vec<(String, String)>,
    spec: ModuleSpec,
}

impl Section {
    fn new(name: &str, spec: ModuleSpec, leading: Vec<String>) -> Self {
        let entries = vec![
            (SOURCE_KEY.to_string(), spec.source.clone()),
            (spec.pin_kind.key().to_string(), spec.pin_value.clone()),
        ];
        Self {
            name: name.to_string(),
            leading,
            entries,
            spec,
        }
    }

    /// Replace the spec, rewriting the matching entries where they stand.
    fn set_spec(&mut self, spec: ModuleSpec) {
        for (key, value) in &mut self.entries {
            if key == SOURCE_KEY || key == LEGACY_SOURCE_KEY {
                *value = spec.source.clone();
            } else if PinKind::from_key(key).is_some() {
                *key = spec.pin_kind.key().to_string();
                *value = spec.pin_value.clone();
            }
        }
        self.spec = spec;
    }
}

/// Ordered mapping of module name to [`ModuleSpec`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    sections: Vec<Section>,
    /// Comment and blank lines after the last section.
    trailing: Vec<String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ManifestNotFound {
                path: path.display().to_string(),
            },
            _ => Error::Io(e),
        })?;
        Self::parse(&content)
    }

    /// Parse manifest text.
    pub fn parse(content: &str) -> Result<Self> {
        let mut sections: Vec<PendingSection> = Vec::new();
        let mut pending_lines = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line_number = index + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                pending_lines.push(line.to_string());
                continue;
            }

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                let name = trimmed[1..trimmed.len() - 1].trim().to_string();
                validate_module_name(&name).map_err(|message| Error::ManifestParse {
                    message: format!("line {}: {}", line_number, message),
                    hint: None,
                })?;
                if sections.iter().any(|section| section.name == name) {
                    return Err(Error::ManifestParse {
                        message: format!("line {}: module '{}' is declared twice", line_number, name),
                        hint: Some("Each module may appear only once".to_string()),
                    });
                }
                sections.push(PendingSection {
                    name,
                    line_number,
                    leading: std::mem::take(&mut pending_lines),
                    entries: Vec::new(),
                });
            } else if let Some(pos) = trimmed.find('=') {
                let key = trimmed[..pos].trim().to_string();
                let value = trimmed[pos + 1..].trim().to_string();
                if key.is_empty() {
                    return Err(Error::ManifestParse {
                        message: format!("line {}: missing key before '='", line_number),
                        hint: None,
                    });
                }
                let Some(section) = sections.last_mut() else {
                    return Err(Error::ManifestParse {
                        message: format!("line {}: '{}' appears before any module section", line_number, key),
                        hint: Some("Start each module with a [name] header".to_string()),
                    });
                };
                // Comments between entries stay attached to the section body
                for comment in pending_lines.drain(..) {
                    section.entries.push((comment, String::new()));
                }
                section.entries.push((key, value));
            } else {
                return Err(Error::ManifestParse {
                    message: format!("line {}: cannot parse '{}'", line_number, trimmed),
                    hint: Some("Expected a [module] header or a key = value line".to_string()),
                });
            }
        }

        let sections = sections
            .into_iter()
            .map(PendingSection::finish)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            sections,
            trailing: pending_lines,
        })
    }

    /// Write the manifest to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ModuleSpec> {
        self.sections
            .iter()
            .find(|section| section.name == name)
            .map(|section| &section.spec)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Add or update a module.
    ///
    /// An existing module keeps its position and formatting; a new one is
    /// appended. Returns the previous spec, if any.
    pub fn insert(&mut self, name: &str, spec: ModuleSpec) -> Result<Option<ModuleSpec>> {
        validate_module_name(name).map_err(|message| Error::ManifestParse {
            message,
            hint: None,
        })?;
        if let Some(section) = self.sections.iter_mut().find(|s| s.name == name) {
            let previous = section.spec.clone();
            section.set_spec(spec);
            return Ok(Some(previous));
        }
        let leading = if self.sections.is_empty() {
            Vec::new()
        } else {
            vec![String::new()]
        };
        self.sections.push(Section::new(name, spec, leading));
        Ok(None)
    }

    /// Module names in manifest order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|section| section.name.as_str())
    }

    /// Modules in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleSpec)> {
        self.sections
            .iter()
            .map(|section| (section.name.as_str(), &section.spec))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            for line in &section.leading {
                writeln!(f, "{}", line)?;
            }
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in &section.entries {
                if is_comment_line(key) {
                    writeln!(f, "{}", key)?;
                } else {
                    writeln!(f, "{} = {}", key, value)?;
                }
            }
        }
        for line in &self.trailing {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

struct PendingSection {
    name: String,
    line_number: usize,
    leading: Vec<String>,
    entries: Vec<(String, String)>,
}

impl PendingSection {
    fn finish(self) -> Result<Section> {
        let parse_error = |message: String, hint: &str| Error::ManifestParse {
            message: format!("module '{}' (line {}): {}", self.name, self.line_number, message),
            hint: Some(hint.to_string()),
        };

        let mut source = None;
        let mut pin = None;
        for (key, value) in &self.entries {
            if is_comment_line(key) {
                continue;
            }
            if value.is_empty() {
                return Err(parse_error(
                    format!("'{}' has an empty value", key),
                    "Remove the key or give it a value",
                ));
            }
            if key == SOURCE_KEY || key == LEGACY_SOURCE_KEY {
                if source.replace(value.clone()).is_some() {
                    return Err(parse_error(
                        "source is given more than once".to_string(),
                        "Keep a single source entry",
                    ));
                }
            } else if let Some(kind) = PinKind::from_key(key) {
                match pin.replace((kind, value.clone())) {
                    Some((previous, _)) if previous == kind => {
                        return Err(parse_error(
                            format!("{} is given more than once", kind),
                            "Keep a single pin entry",
                        ));
                    }
                    Some(_) => {
                        return Err(parse_error(
                            "both commit and ref are set".to_string(),
                            "Pin each module to exactly one of commit or ref",
                        ));
                    }
                    None => {}
                }
            }
        }

        let Some(source) = source else {
            return Err(parse_error(
                "missing source".to_string(),
                "Add 'source = <url>' to the section",
            ));
        };
        let Some((pin_kind, pin_value)) = pin else {
            return Err(parse_error(
                "missing commit or ref".to_string(),
                "Add 'commit = <hash>' or 'ref = <branch or tag>'",
            ));
        };

        Ok(Section {
            name: self.name,
            leading: self.leading,
            entries: self.entries,
            spec: ModuleSpec {
                source,
                pin_kind,
                pin_value,
            },
        })
    }
}

fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';')
}

/// Module names become directory names and branch name suffixes.
fn validate_module_name(name: &str) -> std::result::Result<(), String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._-]*$").expect("valid module name regex"));
    if name.ends_with(".lock") || name.contains("..") || !pattern.is_match(name) {
        return Err(format!("invalid module name '{}'", name));
    }
    Ok(())
}
