//! Pure views over a record collection.
//!
//! None of these functions touch storage; they take a slice and return new
//! values, so they are shared by the store and by callers holding an
//! exported or detached collection.

use std::cmp::Ordering;
use std::collections::HashSet;

use super::model::{HistoryFilter, HistoryStatistics, IdentificationRecord, SortKey};
use crate::error::Result;

/// Returns the records matching `mode`, preserving their order.
pub fn filter(records: &[IdentificationRecord], mode: HistoryFilter) -> Vec<IdentificationRecord> {
    records
        .iter()
        .filter(|record| mode.matches(record))
        .cloned()
        .collect()
}

/// Returns the records ordered by `key`.
///
/// The sort is stable: records comparing equal keep their input order.
/// For `SortKey::Date`, records whose timestamp cannot be parsed are placed
/// after every parseable one.
pub fn sort(records: &[IdentificationRecord], key: SortKey) -> Vec<IdentificationRecord> {
    let mut sorted = records.to_vec();
    match key {
        SortKey::Date => sorted.sort_by(compare_date_desc),
        SortKey::Confidence => sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence)),
        SortKey::Species => sorted.sort_by_cached_key(|record| record.species.to_lowercase()),
    }
    sorted
}

fn compare_date_desc(a: &IdentificationRecord, b: &IdentificationRecord) -> Ordering {
    match (a.parsed_timestamp(), b.parsed_timestamp()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filters then sorts, the composition every history view uses.
pub fn view(
    records: &[IdentificationRecord],
    mode: HistoryFilter,
    key: SortKey,
) -> Vec<IdentificationRecord> {
    sort(&filter(records, mode), key)
}

/// Computes aggregate metrics over `records`.
pub fn statistics(records: &[IdentificationRecord]) -> HistoryStatistics {
    let total = records.len();
    if total == 0 {
        return HistoryStatistics::default();
    }

    let unique_species = records
        .iter()
        .map(|record| record.species.as_str())
        .collect::<HashSet<_>>()
        .len();
    let verified_count = records.iter().filter(|record| record.verified).count();
    let sum: f64 = records.iter().map(|record| record.confidence).sum();

    HistoryStatistics {
        total,
        unique_species,
        verified_count,
        average_confidence: (sum / total as f64).round() as i64,
    }
}

/// Serializes `records` as a 2-space indented JSON array, in the given order.
pub fn export(records: &[IdentificationRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
