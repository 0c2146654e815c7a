//! Identification history domain module.
//!
//! # Module Structure
//!
//! - `model`: `IdentificationRecord`, filter modes, sort keys, statistics
//! - `query`: pure filter/sort/statistics/export over a slice of records
//! - `store`: `HistoryStore`, the per-user collection persisted through a
//!   [`crate::kv::KeyValueStore`]
//! - `session_history`: session-scoped wrapper that turns anonymous access
//!   into no-ops
//! - `seed`: demonstration records for opt-in first-run seeding

mod model;
pub mod query;
mod seed;
mod session_history;
mod store;

pub use model::{
    HistoryFilter, HistoryStatistics, IdentificationRecord, MAX_CONFIDENCE, MIN_CONFIDENCE,
    SortKey, is_valid_confidence,
};
pub use seed::{EXPORT_FILE_NAME, demo_records};
pub use session_history::SessionHistory;
pub use store::{HISTORY_KEY_PREFIX, HistoryStore, history_key, read_collection};
