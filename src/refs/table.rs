//! The reference table: branch pointers plus the current branch.
//!
//! Persisted as JSON in `.minivcs/refs`. HEAD is not stored separately; it
//! is always the commit the current branch points to.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Branch, Head};
use crate::error::{Error, Result};
use crate::infra::{read_file, write_file_atomic};
use crate::objects::Oid;

/// Name of the branch created by `init`.
pub const DEFAULT_BRANCH: &str = "master";

/// Branch name to commit, plus which branch is checked out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefTable {
    branches: BTreeMap<String, Oid>,
    current: String,
}

impl RefTable {
    /// Creates a table with a single `master` branch at `root`.
    pub fn new(root: Oid) -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(DEFAULT_BRANCH.to_string(), root);
        RefTable {
            branches,
            current: DEFAULT_BRANCH.to_string(),
        }
    }

    /// Loads the table from `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or unreadable, or if the current branch
    /// has no pointer.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = read_file(path)?;
        let table: RefTable = serde_json::from_slice(&data)?;

        if !table.branches.contains_key(&table.current) {
            return Err(Error::InvalidObject {
                oid: "refs".to_string(),
                reason: format!("current branch {} has no pointer", table.current),
            });
        }

        Ok(table)
    }

    /// Writes the table to `path` atomically.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_file_atomic(path, &serde_json::to_vec_pretty(self)?)
    }

    /// Returns the current HEAD.
    pub fn head(&self) -> Head {
        Head::new(self.current.clone(), self.head_oid())
    }

    /// Returns the commit HEAD points to.
    pub fn head_oid(&self) -> Oid {
        // `load` and every mutator keep the current branch present.
        self.branches
            .get(&self.current)
            .copied()
            .unwrap_or_else(|| Oid::from_bytes([0; 20]))
    }

    /// Returns the current branch name.
    pub fn current_branch(&self) -> &str {
        &self.current
    }

    /// Returns the commit `name` points to.
    pub fn get(&self, name: &str) -> Option<Oid> {
        self.branches.get(name).copied()
    }

    /// Returns all branches sorted by name, with the current one marked.
    pub fn branches(&self) -> Vec<Branch> {
        self.branches
            .iter()
            .map(|(name, oid)| {
                if *name == self.current {
                    Branch::current(name.clone(), *oid)
                } else {
                    Branch::new(name.clone(), *oid)
                }
            })
            .collect()
    }

    /// Creates `name` pointing at `oid`.
    pub fn create(&mut self, name: &str, oid: Oid) -> Result<()> {
        if self.branches.contains_key(name) {
            return Err(Error::BranchExists(name.to_string()));
        }
        self.branches.insert(name.to_string(), oid);
        Ok(())
    }

    /// Deletes the pointer `name`. The current branch cannot be deleted.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        if !self.branches.contains_key(name) {
            return Err(Error::NoSuchBranch(name.to_string()));
        }
        if name == self.current {
            return Err(Error::CannotDeleteCurrent(name.to_string()));
        }
        self.branches.remove(name);
        Ok(())
    }

    /// Moves the current branch, and with it HEAD, to `oid`.
    pub fn advance(&mut self, oid: Oid) {
        self.branches.insert(self.current.clone(), oid);
    }

    /// Makes `name` the current branch.
    pub fn switch(&mut self, name: &str) -> Result<()> {
        if !self.branches.contains_key(name) {
            return Err(Error::NoSuchBranch(name.to_string()));
        }
        self.current = name.to_string();
        Ok(())
    }
}
