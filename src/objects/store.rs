//! Loose object store: the content-addressable home of blobs and commits.
//!
//! Layout under the objects directory:
//!
//! ```text
//! objects/blobs/<aa>/<38 hex>     zlib("blob <size>\0<file content>")
//! objects/commits/<aa>/<38 hex>   zlib("commit <size>\0<json record>")
//! ```
//!
//! Entries are written once and never modified or removed.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::blob::Blob;
use super::commit::Commit;
use super::oid::{is_hex_prefix, Oid, OID_HEX_LEN};
use crate::error::{Error, Result};
use crate::infra::{compress, decompress, read_file, write_file_atomic};

/// The kind of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    /// File content.
    Blob,
    /// A commit record.
    Commit,
}

impl ObjectType {
    /// Returns the type name used in object headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Commit => "commit",
        }
    }

    /// Parses a type name from an object header.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blob" => Some(ObjectType::Blob),
            "commit" => Some(ObjectType::Commit),
            _ => None,
        }
    }

    fn dir_name(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blobs",
            ObjectType::Commit => "commits",
        }
    }
}

/// A raw stored object with its type and payload.
#[derive(Debug, Clone)]
pub struct RawObject {
    /// The type recorded in the header.
    pub object_type: ObjectType,
    /// The payload (without the header).
    pub content: Vec<u8>,
}

/// An append-only store of blobs and commits keyed by fingerprint.
#[derive(Debug)]
pub struct LooseObjectStore {
    objects_dir: PathBuf,
    compression_level: u8,
}

impl LooseObjectStore {
    /// Creates a store rooted at `objects_dir` that compresses new objects at
    /// `compression_level`.
    pub fn new<P: AsRef<Path>>(objects_dir: P, compression_level: u8) -> Self {
        LooseObjectStore {
            objects_dir: objects_dir.as_ref().to_path_buf(),
            compression_level,
        }
    }

    /// Creates the directory skeleton.
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.objects_dir.join(ObjectType::Blob.dir_name()))?;
        fs::create_dir_all(self.objects_dir.join(ObjectType::Commit.dir_name()))?;
        Ok(())
    }

    /// Converts an Oid to the path of its object file.
    ///
    /// For example, commit `da39a3ee…` lives at `objects/commits/da/39a3ee…`.
    pub fn oid_to_path(&self, object_type: ObjectType, oid: &Oid) -> PathBuf {
        let hex = oid.to_hex();
        self.objects_dir
            .join(object_type.dir_name())
            .join(&hex[..2])
            .join(&hex[2..])
    }

    /// Checks if an object exists in the store.
    pub fn exists(&self, object_type: ObjectType, oid: &Oid) -> bool {
        self.oid_to_path(object_type, oid).is_file()
    }

    /// Reads and parses an object.
    pub fn read(&self, object_type: ObjectType, oid: &Oid) -> Result<RawObject> {
        let path = self.oid_to_path(object_type, oid);
        let compressed = read_file(&path).map_err(|e| match e {
            Error::FileNotFound(_) => Error::ObjectNotFound(oid.to_hex()),
            other => other,
        })?;
        let decompressed = decompress(&compressed)?;
        let raw = Self::parse_raw_object(&decompressed, oid)?;

        if raw.object_type != object_type {
            return Err(Error::InvalidObject {
                oid: oid.to_hex(),
                reason: format!(
                    "expected {}, found {}",
                    object_type.as_str(),
                    raw.object_type.as_str()
                ),
            });
        }

        Ok(raw)
    }

    /// Writes an object under `oid`. Idempotent: an existing entry is left
    /// untouched.
    pub fn write(&self, object_type: ObjectType, oid: &Oid, content: &[u8]) -> Result<()> {
        let path = self.oid_to_path(object_type, oid);
        if path.exists() {
            trace!(oid = %oid.short(), kind = object_type.as_str(), "object already stored");
            return Ok(());
        }

        let header = format!("{} {}\0", object_type.as_str(), content.len());
        let mut raw = header.into_bytes();
        raw.extend_from_slice(content);

        write_file_atomic(&path, &compress(&raw, self.compression_level))?;
        debug!(oid = %oid.short(), kind = object_type.as_str(), size = content.len(), "stored object");

        Ok(())
    }

    /// Stores a blob's content under its fingerprint.
    pub fn put_blob(&self, blob: &Blob) -> Result<Oid> {
        let oid = blob.oid();
        self.write(ObjectType::Blob, &oid, blob.content())?;
        Ok(oid)
    }

    /// Reads the content of a stored blob.
    pub fn blob_content(&self, oid: &Oid) -> Result<Vec<u8>> {
        Ok(self.read(ObjectType::Blob, oid)?.content)
    }

    /// Stores a commit record under its fingerprint.
    pub fn put_commit(&self, commit: &Commit) -> Result<Oid> {
        let oid = commit.id();
        self.write(ObjectType::Commit, &oid, &commit.encode()?)?;
        Ok(oid)
    }

    /// Reads a stored commit.
    ///
    /// A missing commit is reported as `Error::CommitNotFound`.
    pub fn commit(&self, oid: &Oid) -> Result<Commit> {
        let raw = self.read(ObjectType::Commit, oid).map_err(|e| match e {
            Error::ObjectNotFound(hex) => Error::CommitNotFound(hex),
            other => other,
        })?;
        let commit = Commit::decode(&raw.content)?;

        if commit.id() != *oid {
            return Err(Error::InvalidObject {
                oid: oid.to_hex(),
                reason: format!("record carries id {}", commit.id()),
            });
        }

        Ok(commit)
    }

    /// Returns `true` if a commit with this id is stored.
    pub fn has_commit(&self, oid: &Oid) -> bool {
        self.exists(ObjectType::Commit, oid)
    }

    /// Enumerates every stored commit id, sorted.
    pub fn commit_ids(&self) -> Result<Vec<Oid>> {
        let commits_dir = self.objects_dir.join(ObjectType::Commit.dir_name());
        let mut ids = Vec::new();

        if !commits_dir.is_dir() {
            return Ok(ids);
        }

        for fan in fs::read_dir(&commits_dir)? {
            let fan = fan?;
            if !fan.file_type()?.is_dir() {
                continue;
            }
            let dir_prefix = fan.file_name().to_string_lossy().to_string();

            for entry in fs::read_dir(fan.path())? {
                let entry = entry?;
                let name = entry.file_name();
                let full_hex = format!("{}{}", dir_prefix, name.to_string_lossy());
                if full_hex.len() == OID_HEX_LEN {
                    if let Ok(oid) = Oid::from_hex(&full_hex) {
                        ids.push(oid);
                    }
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// Resolves a full or abbreviated commit id.
    ///
    /// # Errors
    ///
    /// - `Error::CommitNotFound` if the prefix is not hex or matches nothing.
    /// - `Error::AmbiguousId` if several commits match.
    pub fn resolve_commit(&self, prefix: &str) -> Result<Oid> {
        if !is_hex_prefix(prefix) {
            return Err(Error::CommitNotFound(prefix.to_string()));
        }

        if prefix.len() == OID_HEX_LEN {
            let oid = Oid::from_hex(prefix)?;
            return if self.has_commit(&oid) {
                Ok(oid)
            } else {
                Err(Error::CommitNotFound(prefix.to_string()))
            };
        }

        let matches: Vec<Oid> = self
            .commit_ids()?
            .into_iter()
            .filter(|oid| oid.starts_with(prefix))
            .collect();

        match matches.as_slice() {
            [] => Err(Error::CommitNotFound(prefix.to_string())),
            [only] => Ok(*only),
            _ => Err(Error::AmbiguousId {
                prefix: prefix.to_string(),
                count: matches.len(),
            }),
        }
    }

    /// Parses a decompressed object into its type and payload.
    ///
    /// Objects have the format: `<type> <size>\0<content>`
    fn parse_raw_object(data: &[u8], oid: &Oid) -> Result<RawObject> {
        let invalid = |reason: String| Error::InvalidObject {
            oid: oid.to_hex(),
            reason,
        };

        let null_pos = data
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| invalid("missing null byte in header".to_string()))?;

        let header = std::str::from_utf8(&data[..null_pos])
            .map_err(|_| invalid("invalid UTF-8 in header".to_string()))?;

        let (type_str, size_str) = header
            .split_once(' ')
            .ok_or_else(|| invalid("missing object size".to_string()))?;

        let object_type = ObjectType::parse(type_str)
            .ok_or_else(|| invalid(format!("unknown object type: {}", type_str)))?;

        let size: usize = size_str
            .parse()
            .map_err(|_| invalid(format!("invalid size: {}", size_str)))?;

        let content = &data[null_pos + 1..];
        if content.len() != size {
            return Err(invalid(format!(
                "size mismatch: header says {} but content is {} bytes",
                size,
                content.len()
            )));
        }

        Ok(RawObject {
            object_type,
            content: content.to_vec(),
        })
    }
}
