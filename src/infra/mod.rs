//! Infrastructure utilities (hashing, compression, filesystem).

pub mod compression;
pub mod fs;
pub mod hash;

pub use compression::{compress, decompress};
pub use fs::{
    append_line, list_working_tree, read_file, remove_file_pruning, safe_join, write_file_atomic,
    REPO_DIR_NAME,
};
pub use hash::{hash_blob, hash_object};
