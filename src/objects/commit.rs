//! Commit objects.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use super::oid::Oid;
use crate::error::{Error, Result};
use crate::infra::hash_object;

/// Format of commit timestamps, e.g. `Sat Nov 11 12:30:00 2017 -0800`.
pub const TIMESTAMP_FORMAT: &str = "%a %b %-d %H:%M:%S %Y %z";

/// Message of the root commit every repository starts from.
pub const ROOT_MESSAGE: &str = "initial commit";

/// Timestamp of the root commit: the Unix epoch, rendered in UTC.
pub const ROOT_TIMESTAMP: &str = "Thu Jan 1 00:00:00 1970 +0000";

/// Formats a point in time the way commits record it.
pub fn format_timestamp<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// The hashed part of a commit: everything except the id itself.
#[derive(Serialize)]
struct CommitBody<'a> {
    message: &'a str,
    timestamp: &'a str,
    parent: Option<Oid>,
    second_parent: Option<Oid>,
    files: &'a BTreeMap<String, Oid>,
}

/// An immutable snapshot of the tracked files plus metadata.
///
/// The id is the fingerprint of the serialized body (message, timestamp,
/// parents and snapshot). Timestamps have one-second resolution, so two
/// commits with the same body made within one second share an id. The root commit has a fixed timestamp and is therefore shared by
/// every repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    id: Oid,
    message: String,
    timestamp: String,
    parent: Option<Oid>,
    second_parent: Option<Oid>,
    files: BTreeMap<String, Oid>,
}

impl Commit {
    /// Creates a commit stamped with the current local time.
    pub fn new(
        message: impl Into<String>,
        parent: Option<Oid>,
        second_parent: Option<Oid>,
        files: BTreeMap<String, Oid>,
    ) -> Result<Self> {
        let timestamp = format_timestamp(&Local::now());
        Self::with_timestamp(message, timestamp, parent, second_parent, files)
    }

    /// Creates a commit with an explicit timestamp string.
    pub fn with_timestamp(
        message: impl Into<String>,
        timestamp: impl Into<String>,
        parent: Option<Oid>,
        second_parent: Option<Oid>,
        files: BTreeMap<String, Oid>,
    ) -> Result<Self> {
        let message = message.into();
        let timestamp = timestamp.into();
        let id = Self::fingerprint(&message, &timestamp, parent, second_parent, &files)?;

        Ok(Commit {
            id,
            message,
            timestamp,
            parent,
            second_parent,
            files,
        })
    }

    /// Creates the root commit: no parents, empty snapshot, epoch timestamp.
    pub fn root() -> Result<Self> {
        Self::with_timestamp(ROOT_MESSAGE, ROOT_TIMESTAMP, None, None, BTreeMap::new())
    }

    fn fingerprint(
        message: &str,
        timestamp: &str,
        parent: Option<Oid>,
        second_parent: Option<Oid>,
        files: &BTreeMap<String, Oid>,
    ) -> Result<Oid> {
        let body = serde_json::to_vec(&CommitBody {
            message,
            timestamp,
            parent,
            second_parent,
            files,
        })?;
        Ok(Oid::from_bytes(hash_object("commit", &body)))
    }

    /// Decodes a stored commit record and checks that its id matches its
    /// content.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let commit: Commit = serde_json::from_slice(data)?;
        let expected = Self::fingerprint(
            &commit.message,
            &commit.timestamp,
            commit.parent,
            commit.second_parent,
            &commit.files,
        )?;
        if expected != commit.id {
            return Err(Error::InvalidObject {
                oid: commit.id.to_hex(),
                reason: format!("content hashes to {}", expected),
            });
        }
        Ok(commit)
    }

    /// Encodes this commit as its persisted record.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Returns the fingerprint of this commit.
    pub fn id(&self) -> Oid {
        self.id
    }

    /// Returns the commit message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the recorded timestamp.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Returns the first parent, `None` for the root commit.
    pub fn parent(&self) -> Option<Oid> {
        self.parent
    }

    /// Returns the merged-in parent of a merge commit.
    pub fn second_parent(&self) -> Option<Oid> {
        self.second_parent
    }

    /// Returns both parents, first parent first.
    pub fn parents(&self) -> impl Iterator<Item = Oid> {
        self.parent.into_iter().chain(self.second_parent)
    }

    /// Returns `true` if this commit has two parents.
    pub fn is_merge(&self) -> bool {
        self.second_parent.is_some()
    }

    /// Returns `true` if this is a root commit.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns the snapshot: tracked file name to blob fingerprint.
    pub fn files(&self) -> &BTreeMap<String, Oid> {
        &self.files
    }

    /// Returns the blob tracked under `name`, if any.
    pub fn file(&self, name: &str) -> Option<Oid> {
        self.files.get(name).copied()
    }

    /// Returns `true` if the snapshot tracks `name`.
    pub fn tracks(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }
}
