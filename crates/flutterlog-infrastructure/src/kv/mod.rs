//! Concrete key-value backends.

mod file;
mod memory;

pub use file::{FileKeyValueStore, FileStoreError, key_file_name};
pub use memory::MemoryKeyValueStore;
