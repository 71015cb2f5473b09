//! Blob objects: the content of one tracked file.

use super::oid::Oid;
use crate::infra::hash_blob;

/// A stored file version.
///
/// Unlike a bare content hash, a blob's fingerprint covers the tracked file
/// name too, so two files with equal bytes but different names are distinct
/// blobs. Only the content is written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    oid: Oid,
    name: String,
    content: Vec<u8>,
}

impl Blob {
    /// Creates a blob for `name` with the given content, computing its
    /// fingerprint.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let content = content.into();
        let oid = Oid::from_bytes(hash_blob(&name, &content));
        Blob { oid, name, content }
    }

    /// Returns the fingerprint of this blob.
    pub fn oid(&self) -> Oid {
        self.oid
    }

    /// Returns the tracked file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw content of the blob.
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}
