//! Content fingerprints.
//!
//! Every stored object is keyed by the SHA-1 of a typed header followed by
//! its payload, so the fingerprint is a pure function of what is stored.

use sha1::{Digest, Sha1};

/// SHA-1 hash size in bytes.
pub const SHA1_SIZE: usize = 20;

/// Computes the fingerprint of a typed object.
///
/// Objects are hashed as: `{type} {size}\0{content}`
pub fn hash_object(object_type: &str, content: &[u8]) -> [u8; SHA1_SIZE] {
    let header = format!("{} {}\0", object_type, content.len());
    let mut hasher = Sha1::new();
    hasher.update(header.as_bytes());
    hasher.update(content);
    hasher.finalize().into()
}

/// Computes the fingerprint of a blob, which covers both its tracked file
/// name and its content.
///
/// Hashed as: `blob {name_len} {name}\0{size}\0{content}`
pub fn hash_blob(name: &str, content: &[u8]) -> [u8; SHA1_SIZE] {
    let header = format!("blob {} {}\0{}\0", name.len(), name, content.len());
    let mut hasher = Sha1::new();
    hasher.update(header.as_bytes());
    hasher.update(content);
    hasher.finalize().into()
}
