//! The commit journal (`.minivcs/journal`).
//!
//! One commit id per line, in creation order. The file is only ever
//! appended to. A trailing line cut short by a crash is skipped on load.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Error, Result};
use crate::infra::{append_line, read_file};
use crate::objects::Oid;

/// Append-only record of every commit created in a repository.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Opens the journal at `path`. The file need not exist yet.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Journal {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Records a newly created commit.
    pub fn append(&self, oid: &Oid) -> Result<()> {
        append_line(&self.path, &oid.to_hex())
    }

    /// Returns every recorded commit id, oldest first.
    ///
    /// # Errors
    ///
    /// A malformed line anywhere but at the very end is reported as
    /// `Error::InvalidObject`.
    pub fn entries(&self) -> Result<Vec<Oid>> {
        let data = match read_file(&self.path) {
            Ok(data) => data,
            Err(Error::FileNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let text = String::from_utf8_lossy(&data);
        let complete = text.ends_with('\n');
        let lines: Vec<&str> = text.lines().collect();

        let mut ids = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match Oid::from_hex(line) {
                Ok(oid) => ids.push(oid),
                Err(_) if index + 1 == lines.len() && !complete => {
                    warn!(path = %self.path.display(), line = index + 1, "skipping torn journal entry");
                }
                Err(_) => {
                    return Err(Error::InvalidObject {
                        oid: "journal".to_string(),
                        reason: format!("line {} is not a commit id", index + 1),
                    })
                }
            }
        }

        Ok(ids)
    }
}
