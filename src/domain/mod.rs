mod ed2k;
mod fields;
mod mylist;

pub use ed2k::{Ed2kHash, HashedFile};
pub use fields::{FieldSet, FieldValue};
pub use mylist::{FileState, MylistUpdate};
