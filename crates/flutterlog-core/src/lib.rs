//! Domain layer for Flutterlog, a per-user butterfly identification history.
//!
//! The central type is [`history::HistoryStore`], which owns one user's
//! collection of [`history::IdentificationRecord`]s and persists it through
//! an injected [`kv::KeyValueStore`].

pub mod classification;
pub mod error;
pub mod history;
pub mod kv;
pub mod session;

#[cfg(test)]
mod test_support;

// Re-export common error type
pub use error::FlutterlogError;
