//! Staleness detection against a persisted [`CacheDocument`].
//!
//! A file is stale when its current modified time differs from the recorded
//! one, in either direction. Content is never read here.

use crate::document::CacheDocument;
use std::collections::HashMap;
use std::path::PathBuf;

/// Result of comparing the files on disk with a cache document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Files not recorded in the document.
    pub new_files: Vec<PathBuf>,

    /// Files whose modified time differs from the document.
    pub modified_files: Vec<PathBuf>,

    /// Files recorded in the document but no longer present.
    pub deleted_files: Vec<PathBuf>,

    /// Files whose modified time matches the document.
    pub unchanged_files: Vec<PathBuf>,
}

impl ChangeSet {
    /// Returns `true` if nothing was added, modified or deleted.
    pub fn is_empty(&self) -> bool {
        self.new_files.is_empty() && self.modified_files.is_empty() && self.deleted_files.is_empty()
    }

    /// Returns the number of files that must be tokenized (new + modified).
    pub fn dirty_count(&self) -> usize {
        self.new_files.len() + self.modified_files.len()
    }
}

/// Classifies every file in `current` (path to modified time) against the
/// sources and headers recorded in `document`.
pub fn detect_changes(current: &HashMap<PathBuf, i64>, document: &CacheDocument) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (path, modified) in current {
        match document.file(path) {
            Some(entry) if entry.modified == *modified => {
                changes.unchanged_files.push(path.clone())
            }
            Some(_) => changes.modified_files.push(path.clone()),
            None => changes.new_files.push(path.clone()),
        }
    }

    changes.deleted_files = document
        .sources
        .keys()
        .chain(document.headers.keys())
        .filter(|p| !current.contains_key(*p))
        .cloned()
        .collect();

    changes.new_files.sort();
    changes.modified_files.sort();
    changes.deleted_files.sort();
    changes.unchanged_files.sort();
    changes
}
