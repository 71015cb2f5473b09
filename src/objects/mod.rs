//! Stored object types (blob, commit) and the store that holds them.

pub mod blob;
pub mod commit;
pub mod oid;
pub mod store;

pub use blob::Blob;
pub use commit::{format_timestamp, Commit, ROOT_MESSAGE, ROOT_TIMESTAMP, TIMESTAMP_FORMAT};
pub use oid::Oid;
pub use store::{LooseObjectStore, ObjectType, RawObject};
