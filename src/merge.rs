//! Three-way merge: split point discovery and per-file resolution.
//!
//! The split point is found in two phases. First every ancestor of the
//! target tip is marked, following both parent links. Then the current
//! branch's ancestors are visited breadth-first (again following both
//! parents) and the first marked commit is the split point. This is not
//! always the best common ancestor in criss-cross histories.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::error::{Error, Result};
use crate::objects::{LooseObjectStore, Oid};

/// The result of a merge that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The current branch was an ancestor of the target; the target was
    /// checked out and no merge commit was made.
    FastForwarded,
    /// The target is already contained in the current branch.
    AlreadyUpToDate,
    /// A merge commit was made. `conflicts` lists files written with
    /// conflict markers, if any.
    Merged {
        /// The merge commit.
        commit: Oid,
        /// Conflicted file names, sorted.
        conflicts: Vec<String>,
    },
}

impl MergeOutcome {
    /// Returns `true` if at least one file conflicted.
    pub fn has_conflicts(&self) -> bool {
        matches!(self, MergeOutcome::Merged { conflicts, .. } if !conflicts.is_empty())
    }
}

/// What the merge does with one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Check out the target's version and stage it.
    TakeTarget(Oid),
    /// Stage removal and delete the working file.
    Remove,
    /// Write conflict markers around both versions; either side may be
    /// absent.
    Conflict {
        /// The current branch's version.
        current: Option<Oid>,
        /// The target branch's version.
        target: Option<Oid>,
    },
}

/// Finds the split point of `current` and `target`.
///
/// # Errors
///
/// Fails with `Error::CommitNotFound` if a commit on either side cannot be
/// read or the histories share no commit.
pub fn find_split_point(store: &LooseObjectStore, current: Oid, target: Oid) -> Result<Oid> {
    let mut marked = HashSet::new();
    let mut queue = VecDeque::from([target]);

    while let Some(oid) = queue.pop_front() {
        if !marked.insert(oid) {
            continue;
        }
        queue.extend(store.commit(&oid)?.parents());
    }

    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([current]);

    while let Some(oid) = queue.pop_front() {
        if marked.contains(&oid) {
            return Ok(oid);
        }
        if !visited.insert(oid) {
            continue;
        }
        queue.extend(store.commit(&oid)?.parents());
    }

    Err(Error::CommitNotFound(format!(
        "common ancestor of {} and {}",
        current.short(),
        target.short()
    )))
}

/// Decides, for every file named by any of the three snapshots, what the
/// merge must do. Files the merge leaves alone are omitted.
pub fn plan(
    split: &BTreeMap<String, Oid>,
    current: &BTreeMap<String, Oid>,
    target: &BTreeMap<String, Oid>,
) -> BTreeMap<String, Resolution> {
    let names: BTreeSet<&String> = split.keys().chain(current.keys()).chain(target.keys()).collect();

    names
        .into_iter()
        .filter_map(|name| {
            resolve(split.get(name), current.get(name), target.get(name))
                .map(|resolution| (name.clone(), resolution))
        })
        .collect()
}

fn resolve(split: Option<&Oid>, current: Option<&Oid>, target: Option<&Oid>) -> Option<Resolution> {
    let conflict = Some(Resolution::Conflict {
        current: current.copied(),
        target: target.copied(),
    });

    match (split, current, target) {
        (Some(s), Some(c), Some(t)) => {
            if c == s && t != s {
                Some(Resolution::TakeTarget(*t))
            } else if c != s && t != s && c != t {
                conflict
            } else {
                None
            }
        }
        (Some(s), Some(c), None) => {
            if c == s {
                Some(Resolution::Remove)
            } else {
                conflict
            }
        }
        (Some(s), None, Some(t)) => {
            if t == s {
                None
            } else {
                conflict
            }
        }
        (None, None, Some(t)) => Some(Resolution::TakeTarget(*t)),
        (None, Some(c), Some(t)) => {
            if c == t {
                None
            } else {
                conflict
            }
        }
        _ => None,
    }
}

/// Builds the content of a conflicted file. An absent side contributes
/// nothing between its markers.
pub fn conflict_content(current: &[u8], target: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(current.len() + target.len() + 32);
    out.extend_from_slice(b"<<<<<<< HEAD\n");
    out.extend_from_slice(current);
    out.extend_from_slice(b"=======\n");
    out.extend_from_slice(target);
    out.extend_from_slice(b">>>>>>>\n");
    out
}

/// The message of a merge commit.
pub fn merge_message(target_branch: &str, current_branch: &str) -> String {
    format!("Merged {} into {}.", target_branch, current_branch)
}
