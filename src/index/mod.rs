//! The staging area.
//!
//! The staging area (`.minivcs/index`) records the changes that will go into
//! the next commit, relative to the current HEAD snapshot: files staged for
//! addition (name to blob fingerprint) and files staged for removal.
//!
//! A name is never staged for both at once.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::infra::{read_file, write_file_atomic};
use crate::objects::Oid;

/// Pending additions and removals relative to HEAD.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingArea {
    additions: BTreeMap<String, Oid>,
    removals: BTreeSet<String>,
}

impl StagingArea {
    /// Creates an empty staging area.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the staging area from `path`. A missing file yields an empty
    /// staging area.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        match read_file(path) {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(Error::FileNotFound(_)) => Ok(Self::new()),
            Err(e) => Err(e),
        }
    }

    /// Writes the staging area to `path` atomically.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_file_atomic(path, &serde_json::to_vec_pretty(self)?)
    }

    /// Stages `name` for addition with the given blob, dropping any pending
    /// removal of it.
    pub fn stage_add(&mut self, name: impl Into<String>, blob: Oid) {
        let name = name.into();
        self.removals.remove(&name);
        self.additions.insert(name, blob);
    }

    /// Stages `name` for removal, dropping any pending addition of it.
    pub fn stage_remove(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.additions.remove(&name);
        self.removals.insert(name);
    }

    /// Drops every pending change for `name`.
    ///
    /// Returns `true` if anything was staged.
    pub fn unstage(&mut self, name: &str) -> bool {
        let added = self.additions.remove(name).is_some();
        let removed = self.removals.remove(name);
        added || removed
    }

    /// Empties the staging area.
    pub fn clear(&mut self) {
        self.additions.clear();
        self.removals.clear();
    }

    /// Returns `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Returns the files staged for addition.
    pub fn additions(&self) -> &BTreeMap<String, Oid> {
        &self.additions
    }

    /// Returns the files staged for removal.
    pub fn removals(&self) -> &BTreeSet<String> {
        &self.removals
    }

    /// Returns the blob staged for `name`, if any.
    pub fn staged_blob(&self, name: &str) -> Option<Oid> {
        self.additions.get(name).copied()
    }

    /// Returns `true` if `name` is staged for addition.
    pub fn is_staged_for_addition(&self, name: &str) -> bool {
        self.additions.contains_key(name)
    }

    /// Returns `true` if `name` is staged for removal.
    pub fn is_staged_for_removal(&self, name: &str) -> bool {
        self.removals.contains(name)
    }

    /// Applies the staged changes to a parent snapshot.
    pub fn apply_to(&self, parent: &BTreeMap<String, Oid>) -> BTreeMap<String, Oid> {
        let mut files = parent.clone();
        for (name, oid) in &self.additions {
            files.insert(name.clone(), *oid);
        }
        for name in &self.removals {
            files.remove(name);
        }
        files
    }
}
