//! Working tree status.
//!
//! Status compares three things: the HEAD snapshot, the staging area and the
//! files currently in the working tree.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::index::StagingArea;
use crate::infra::{list_working_tree, read_file, safe_join};
use crate::objects::{Blob, Oid};
use crate::refs::Branch;

/// How a file differs from what would be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modification {
    /// The working file's content differs.
    Modified,
    /// The working file is gone.
    Deleted,
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modification::Modified => f.write_str("modified"),
            Modification::Deleted => f.write_str("deleted"),
        }
    }
}

/// A snapshot of the repository's status. Every list is sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    branches: Vec<Branch>,
    staged: Vec<String>,
    removed: Vec<String>,
    modifications: Vec<(String, Modification)>,
    untracked: Vec<String>,
}

impl Status {
    /// Returns all branches, the current one marked.
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Returns the files staged for addition.
    pub fn staged(&self) -> &[String] {
        &self.staged
    }

    /// Returns the files staged for removal.
    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    /// Returns tracked files whose working copy differs from what would be
    /// committed.
    pub fn modifications(&self) -> &[(String, Modification)] {
        &self.modifications
    }

    /// Returns working files that are neither tracked nor staged.
    pub fn untracked(&self) -> &[String] {
        &self.untracked
    }

    /// Returns `true` if nothing is staged, modified or untracked.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.removed.is_empty()
            && self.modifications.is_empty()
            && self.untracked.is_empty()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Branches ===")?;
        for branch in &self.branches {
            writeln!(f, "{}", branch)?;
        }

        writeln!(f, "\n=== Staged Files ===")?;
        for name in &self.staged {
            writeln!(f, "{}", name)?;
        }

        writeln!(f, "\n=== Removed Files ===")?;
        for name in &self.removed {
            writeln!(f, "{}", name)?;
        }

        writeln!(f, "\n=== Modifications Not Staged For Commit ===")?;
        for (name, change) in &self.modifications {
            writeln!(f, "{} ({})", name, change)?;
        }

        writeln!(f, "\n=== Untracked Files ===")?;
        for name in &self.untracked {
            writeln!(f, "{}", name)?;
        }

        Ok(())
    }
}

/// Returns the fingerprint a working file would get if it were added, or
/// `None` if the file does not exist.
pub fn working_fingerprint(work_dir: &Path, name: &str) -> Result<Option<Oid>> {
    let path = safe_join(work_dir, name)?;
    if !path.is_file() {
        return Ok(None);
    }
    let content = read_file(&path)?;
    Ok(Some(Blob::new(name, content).oid()))
}

/// Computes the status of the working tree against HEAD and the staging
/// area.
pub fn compute_status(
    work_dir: &Path,
    head_files: &BTreeMap<String, Oid>,
    staging: &StagingArea,
    branches: Vec<Branch>,
) -> Result<Status> {
    let working: BTreeSet<String> = list_working_tree(work_dir)?.into_iter().collect();

    let mut modifications = BTreeMap::new();

    // Staged content that no longer matches the working file.
    for (name, staged) in staging.additions() {
        match working_fingerprint(work_dir, name)? {
            None => {
                modifications.insert(name.clone(), Modification::Deleted);
            }
            Some(current) if current != *staged => {
                modifications.insert(name.clone(), Modification::Modified);
            }
            Some(_) => {}
        }
    }

    // Tracked content changed or deleted without being staged.
    for (name, tracked) in head_files {
        if staging.is_staged_for_addition(name) || staging.is_staged_for_removal(name) {
            continue;
        }
        match working_fingerprint(work_dir, name)? {
            None => {
                modifications.insert(name.clone(), Modification::Deleted);
            }
            Some(current) if current != *tracked => {
                modifications.insert(name.clone(), Modification::Modified);
            }
            Some(_) => {}
        }
    }

    let untracked = working
        .iter()
        .filter(|name| {
            !staging.is_staged_for_addition(name)
                && (!head_files.contains_key(*name) || staging.is_staged_for_removal(name))
        })
        .cloned()
        .collect();

    Ok(Status {
        branches,
        staged: staging.additions().keys().cloned().collect(),
        removed: staging.removals().iter().cloned().collect(),
        modifications: modifications.into_iter().collect(),
        untracked,
    })
}
