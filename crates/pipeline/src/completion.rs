//! Completion set: asset keys already published elsewhere.

use std::collections::BTreeSet;

use crate::error::ToolError;

/// Keys considered externally complete. Read-only for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    keys: BTreeSet<String>,
}

impl CompletionSet {
    /// Builds the set from a newline-delimited listing.
    ///
    /// Each non-blank line contributes its last whitespace-delimited field with
    /// the file extension removed.
    pub fn parse_listing(text: &str) -> Self {
        text.lines().filter_map(completion_key).collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Key of one listing line, `None` for blank lines.
pub fn completion_key(line: &str) -> Option<String> {
    let field = line.split_whitespace().last()?;
    Some(strip_extension(field).to_string())
}

/// Removes the last `.ext`; a leading dot is part of the name.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Collaborator listing the assets already published/seeded.
pub trait CompletionOracle {
    fn completed(&self) -> Result<CompletionSet, ToolError>;
}
