//! Branch representation.

use std::fmt;

use crate::objects::Oid;

/// A named pointer to a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    name: String,
    oid: Oid,
    is_current: bool,
}

impl Branch {
    /// Creates a branch that is not checked out.
    pub fn new(name: impl Into<String>, oid: Oid) -> Self {
        Branch {
            name: name.into(),
            oid,
            is_current: false,
        }
    }

    /// Creates a branch marked as the checked-out one.
    pub fn current(name: impl Into<String>, oid: Oid) -> Self {
        Branch {
            name: name.into(),
            oid,
            is_current: true,
        }
    }

    /// Returns the branch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the commit the branch points to.
    pub fn oid(&self) -> Oid {
        self.oid
    }

    /// Returns `true` if this is the current branch.
    pub fn is_current(&self) -> bool {
        self.is_current
    }
}

/// Renders the branch as it appears in `status`: the current one gets a
/// leading `*`.
impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_current {
            write!(f, "*{}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_accessors() {
        let oid = Oid::from_bytes([1; 20]);
        let branch = Branch::new("feature", oid);

        assert_eq!(branch.name(), "feature");
        assert_eq!(branch.oid(), oid);
        assert!(!branch.is_current());
    }

    #[test]
    fn test_branch_display() {
        let oid = Oid::from_bytes([1; 20]);
        assert_eq!(Branch::current("master", oid).to_string(), "*master");
        assert_eq!(Branch::new("feature", oid).to_string(), "feature");
    }
}
