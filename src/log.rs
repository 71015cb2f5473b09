//! Commit history traversal and rendering.
//!
//! `log` walks first-parent links from HEAD back to the root commit, most
//! recent first. Entries render in the classic block format:
//!
//! ```text
//! ===
//! commit a0da1ea5a15ab613bf9961fd86f010cf74c7ee48
//! Merge: 4975af1 2c1ead1
//! Date: Sat Nov 11 12:30:00 2017 -0800
//! Merged development into master.
//! ```
//!
//! The `Merge:` line only appears for commits with a second parent.

use std::fmt;

use crate::config::DEFAULT_ABBREV;
use crate::error::Result;
use crate::objects::{Commit, LooseObjectStore, Oid};

/// Options for a history walk.
#[derive(Debug, Clone)]
pub struct LogOptions {
    max_count: Option<usize>,
    abbrev: usize,
}

impl Default for LogOptions {
    fn default() -> Self {
        LogOptions {
            max_count: None,
            abbrev: DEFAULT_ABBREV,
        }
    }
}

impl LogOptions {
    /// Creates options that walk the whole history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the number of entries returned.
    pub fn max_count(mut self, n: usize) -> Self {
        self.max_count = Some(n);
        self
    }

    /// Sets how many hex digits merge parents are shown with.
    pub fn abbrev(mut self, digits: usize) -> Self {
        self.abbrev = digits;
        self
    }
}

/// One commit as shown by `log`, `global-log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    id: Oid,
    merge_parents: Option<(Oid, Oid)>,
    timestamp: String,
    message: String,
    abbrev: usize,
}

impl LogEntry {
    /// Builds the entry for `commit`, abbreviating merge parents to
    /// `abbrev` digits when rendered.
    pub fn from_commit(commit: &Commit, abbrev: usize) -> Self {
        let merge_parents = match (commit.parent(), commit.second_parent()) {
            (Some(first), Some(second)) => Some((first, second)),
            _ => None,
        };

        LogEntry {
            id: commit.id(),
            merge_parents,
            timestamp: commit.timestamp().to_string(),
            message: commit.message().to_string(),
            abbrev,
        }
    }

    /// Returns the commit id.
    pub fn id(&self) -> Oid {
        self.id
    }

    /// Returns `(first parent, second parent)` for merge commits.
    pub fn merge_parents(&self) -> Option<(Oid, Oid)> {
        self.merge_parents
    }

    /// Returns the commit timestamp.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Returns the commit message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===")?;
        writeln!(f, "commit {}", self.id)?;
        if let Some((first, second)) = self.merge_parents {
            writeln!(
                f,
                "Merge: {} {}",
                first.abbrev(self.abbrev),
                second.abbrev(self.abbrev)
            )?;
        }
        writeln!(f, "Date: {}", self.timestamp)?;
        writeln!(f, "{}", self.message)
    }
}

/// An iterator over the first-parent history of a commit.
///
/// Yields `Err` once and then stops if a commit cannot be read.
pub struct LogIterator<'a> {
    store: &'a LooseObjectStore,
    next: Option<Oid>,
    options: LogOptions,
    count: usize,
}

impl<'a> LogIterator<'a> {
    /// Starts a walk at `start`.
    pub fn new(store: &'a LooseObjectStore, start: Oid, options: LogOptions) -> Self {
        LogIterator {
            store,
            next: Some(start),
            options,
            count: 0,
        }
    }
}

impl Iterator for LogIterator<'_> {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(max) = self.options.max_count {
            if self.count >= max {
                return None;
            }
        }

        let oid = self.next.take()?;
        let commit = match self.store.commit(&oid) {
            Ok(commit) => commit,
            Err(e) => return Some(Err(e)),
        };

        self.next = commit.parent();
        self.count += 1;

        Some(Ok(LogEntry::from_commit(&commit, self.options.abbrev)))
    }
}
