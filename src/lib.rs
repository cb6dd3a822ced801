#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod djb2;

mod error;

pub mod hash_table;

pub mod sync_table;

pub use djb2::Djb2;
pub use error::Error;
pub use hash_table::HashTable;
pub use sync_table::SyncHashTable;
