pub mod backend;
pub mod config;
pub mod kv;
pub mod paths;

pub use crate::backend::{BackendKind, open_backend, open_session_history};
pub use crate::config::AppConfig;
pub use crate::kv::{FileKeyValueStore, MemoryKeyValueStore};
