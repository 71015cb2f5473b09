//! HEAD representation.

use crate::objects::Oid;

/// The checked-out branch and the commit it points to.
///
/// There is no detached state: HEAD is always a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    branch: String,
    oid: Oid,
}

impl Head {
    /// Creates a HEAD on `branch` at `oid`.
    pub fn new(branch: impl Into<String>, oid: Oid) -> Self {
        Head {
            branch: branch.into(),
            oid,
        }
    }

    /// Returns the current branch name.
    pub fn branch_name(&self) -> &str {
        &self.branch
    }

    /// Returns the HEAD commit.
    pub fn oid(&self) -> Oid {
        self.oid
    }
}
