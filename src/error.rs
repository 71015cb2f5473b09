//! Error types for minivcs.
//!
//! Every failing operation aborts before its first write, so an `Err` always
//! means the repository was left exactly as it was found. Merge conflicts are
//! not errors; they are reported through [`crate::merge::MergeOutcome`].

use std::path::PathBuf;

use thiserror::Error;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An object, commit, branch or file is absent.
    NotFound,
    /// The repository is not in a state that allows the operation.
    InvalidState,
    /// An untracked working file would be overwritten.
    Obstruction,
    /// An abbreviated id matches more than one commit.
    Ambiguous,
    /// The underlying filesystem failed.
    Io,
    /// Stored data could not be decoded.
    Corrupt,
}

/// The main error type for minivcs operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No repository exists at (or above) the given path.
    #[error("not in an initialized minivcs directory: {}", .0.display())]
    NotARepository(PathBuf),

    /// A repository already exists at the given path.
    #[error("a minivcs repository already exists in {}", .0.display())]
    AlreadyARepository(PathBuf),

    /// The requested object is not in the store.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// No commit matches the given id or prefix.
    #[error("no commit with that id exists: {0}")]
    CommitNotFound(String),

    /// An abbreviated id matches several commits.
    #[error("ambiguous commit id {prefix}: {count} commits match")]
    AmbiguousId {
        /// The prefix that was looked up.
        prefix: String,
        /// The number of matching commits.
        count: usize,
    },

    /// The provided string is not a valid object id.
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    /// The object is invalid or corrupted.
    #[error("invalid object {oid}: {reason}")]
    InvalidObject {
        /// The object ID.
        oid: String,
        /// The reason for invalidity.
        reason: String,
    },

    /// Zlib decompression failed.
    #[error("zlib decompression failed")]
    DecompressionFailed,

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The working-tree file does not exist.
    #[error("file does not exist: {0}")]
    FileNotFound(String),

    /// The file is not part of the commit's snapshot.
    #[error("file does not exist in that commit: {0}")]
    FileNotInCommit(String),

    /// The file is neither staged nor tracked.
    #[error("no reason to remove the file: {0}")]
    NothingToRemove(String),

    /// Nothing is staged.
    #[error("no changes added to the commit")]
    NothingToCommit,

    /// The commit message is blank.
    #[error("please enter a commit message")]
    EmptyMessage,

    /// No commit carries the given message.
    #[error("found no commit with that message: {0}")]
    NoMatch(String),

    /// The branch does not exist.
    #[error("no such branch exists: {0}")]
    NoSuchBranch(String),

    /// The branch already exists.
    #[error("a branch with that name already exists: {0}")]
    BranchExists(String),

    /// The branch is already checked out.
    #[error("no need to checkout the current branch: {0}")]
    AlreadyOnBranch(String),

    /// The current branch cannot be deleted.
    #[error("cannot remove the current branch: {0}")]
    CannotDeleteCurrent(String),

    /// Merge refused because changes are staged.
    #[error("you have uncommitted changes")]
    DirtyStagingArea,

    /// Merge refused because source and target are the same branch.
    #[error("cannot merge a branch with itself: {0}")]
    SelfMerge(String),

    /// An untracked working file would be overwritten.
    #[error("there is an untracked file in the way; delete it, or add and commit it first: {0}")]
    UntrackedObstruction(String),
}

impl Error {
    /// Returns the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::Serialization(_)
            | Error::InvalidObject { .. }
            | Error::DecompressionFailed
            | Error::InvalidConfig(_) => ErrorKind::Corrupt,
            Error::NotARepository(_)
            | Error::ObjectNotFound(_)
            | Error::CommitNotFound(_)
            | Error::InvalidOid(_)
            | Error::FileNotFound(_)
            | Error::FileNotInCommit(_)
            | Error::NothingToRemove(_)
            | Error::NoMatch(_)
            | Error::NoSuchBranch(_) => ErrorKind::NotFound,
            Error::AmbiguousId { .. } => ErrorKind::Ambiguous,
            Error::UntrackedObstruction(_) => ErrorKind::Obstruction,
            Error::AlreadyARepository(_)
            | Error::NothingToCommit
            | Error::EmptyMessage
            | Error::BranchExists(_)
            | Error::AlreadyOnBranch(_)
            | Error::CannotDeleteCurrent(_)
            | Error::DirtyStagingArea
            | Error::SelfMerge(_) => ErrorKind::InvalidState,
        }
    }
}

/// Result type alias for minivcs operations.
pub type Result<T> = std::result::Result<T, Error>;
