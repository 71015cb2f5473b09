//! # minivcs
//!
//! A minimal, local version-control engine.
//!
//! minivcs tracks snapshots of a working tree as an immutable,
//! content-addressable commit graph. It supports staging, branches,
//! checkout, reset and three-way merging with conflict markers.
//!
//! ## Quick Start
//!
//! ```no_run
//! use minivcs::{MergeOutcome, Repository, Result};
//!
//! fn main() -> Result<()> {
//!     let mut repo = Repository::init("path/to/project")?;
//!
//!     std::fs::write("path/to/project/a.txt", "hello")?;
//!     repo.add("a.txt")?;
//!     repo.commit("first")?;
//!
//!     repo.branch("feature")?;
//!
//!     // Diverge: one commit on each branch.
//!     repo.checkout_branch("feature")?;
//!     std::fs::write("path/to/project/a.txt", "world")?;
//!     repo.add("a.txt")?;
//!     repo.commit("second")?;
//!
//!     repo.checkout_branch("master")?;
//!     std::fs::write("path/to/project/b.txt", "more")?;
//!     repo.add("b.txt")?;
//!     repo.commit("third")?;
//!
//!     match repo.merge("feature")? {
//!         MergeOutcome::Merged { conflicts, .. } => {
//!             println!("merged with {} conflicts", conflicts.len())
//!         }
//!         MergeOutcome::FastForwarded => println!("fast-forwarded"),
//!         MergeOutcome::AlreadyUpToDate => println!("already up to date"),
//!     }
//!
//!     for entry in repo.log()? {
//!         println!("{}", entry);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`error`] - Error types and Result alias
//! - [`repository`] - The `Repository` engine
//! - [`objects`] - Blobs, commits and the object store
//! - [`refs`] - Branches and HEAD
//! - [`index`] - The staging area
//! - [`merge`] - Split point discovery and three-way resolution
//! - [`status`] - Working tree status
//! - [`log`] - History traversal and rendering

pub mod config;
pub mod error;
pub mod index;
pub mod journal;
pub mod log;
pub mod merge;
pub mod objects;
pub mod refs;
pub mod repository;
pub mod status;
pub mod worktree;

// Internal modules (not part of public API)
pub(crate) mod infra;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use repository::Repository;

pub use objects::{Blob, Commit, Oid};

pub use refs::{Branch, Head};

pub use index::StagingArea;

pub use log::{LogEntry, LogOptions};
pub use merge::MergeOutcome;
pub use status::{Modification, Status};
