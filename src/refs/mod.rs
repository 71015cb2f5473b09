//! References (HEAD, branches).

pub mod branch;
pub mod head;
pub mod table;

pub use branch::Branch;
pub use head::Head;
pub use table::{RefTable, DEFAULT_BRANCH};
