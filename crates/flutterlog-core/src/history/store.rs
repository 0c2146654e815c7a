//! Per-user identification history backed by a key-value store.

use tracing::{debug, info, warn};

use super::model::{HistoryFilter, HistoryStatistics, IdentificationRecord, SortKey};
use super::query;
use crate::classification::ClassificationResult;
use crate::error::{FlutterlogError, Result};
use crate::kv::KeyValueStore;
use crate::session::UserId;

/// Key prefix for persisted collections: `history:{user_id}`.
pub const HISTORY_KEY_PREFIX: &str = "history:";

/// Returns the backend key holding `user_id`'s collection.
pub fn history_key(user_id: &UserId) -> String {
    format!("{}{}", HISTORY_KEY_PREFIX, user_id)
}

/// Reads and parses the collection stored under `key`.
///
/// # Returns
///
/// - `Ok(None)`: the key is absent
/// - `Ok(Some(records))`: the stored array
/// - `Err(FlutterlogError::StorageRead)`: the value is not a record array,
///   or the backend failed to read it
pub fn read_collection<S: KeyValueStore + ?Sized>(
    backend: &S,
    key: &str,
) -> Result<Option<Vec<IdentificationRecord>>> {
    let raw = backend
        .get(key)
        .map_err(|e| FlutterlogError::storage_read(key, e.to_string()))?;

    match raw {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| FlutterlogError::storage_read(key, e.to_string())),
    }
}

/// One user's identification history.
///
/// The store keeps the last successfully persisted collection in memory.
/// Every mutation builds the next collection, writes it through the backend,
/// and only then replaces the in-memory copy, so a failed write leaves the
/// store exactly as it was.
///
/// # Example
///
/// ```
/// use flutterlog_core::history::{HistoryStore, IdentificationRecord};
/// use flutterlog_core::kv::KeyValueStore;
/// use flutterlog_core::session::UserId;
/// # use flutterlog_core::error::Result;
/// # use std::{collections::HashMap, sync::Mutex};
/// # #[derive(Default)]
/// # struct Mem(Mutex<HashMap<String, String>>);
/// # impl KeyValueStore for Mem {
/// #     fn get(&self, k: &str) -> Result<Option<String>> {
/// #         Ok(self.0.lock().unwrap().get(k).cloned())
/// #     }
/// #     fn set(&self, k: &str, v: &str) -> Result<()> {
/// #         self.0.lock().unwrap().insert(k.into(), v.into());
/// #         Ok(())
/// #     }
/// #     fn remove(&self, k: &str) -> Result<()> {
/// #         self.0.lock().unwrap().remove(k);
/// #         Ok(())
/// #     }
/// # }
///
/// let user = UserId::new("alice").unwrap();
/// let mut store = HistoryStore::open(Mem::default(), user);
/// store
///     .insert(IdentificationRecord::new("MONARCH", 94.2, "monarch.jpg"))
///     .unwrap();
/// assert_eq!(store.statistics().total, 1);
/// ```
pub struct HistoryStore<S: KeyValueStore> {
    backend: S,
    user_id: UserId,
    key: String,
    records: Vec<IdentificationRecord>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Opens the store for `user_id` and loads its collection.
    pub fn open(backend: S, user_id: UserId) -> Self {
        let key = history_key(&user_id);
        let mut store = Self {
            backend,
            user_id,
            key,
            records: Vec::new(),
        };
        store.load();
        store
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current collection, most recently inserted first.
    pub fn records(&self) -> &[IdentificationRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&IdentificationRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Re-reads the collection from the backend.
    ///
    /// An absent key yields an empty collection. A malformed value or a
    /// backend read failure is logged and also yields an empty collection;
    /// the stored value is left untouched until the next successful write.
    pub fn load(&mut self) -> &[IdentificationRecord] {
        self.records = match read_collection(&self.backend, &self.key) {
            Ok(Some(records)) => {
                debug!(
                    "[HistoryStore] Loaded {} records for user '{}'",
                    records.len(),
                    self.user_id
                );
                records
            }
            Ok(None) => {
                debug!("[HistoryStore] No history stored for user '{}'", self.user_id);
                Vec::new()
            }
            Err(e) => {
                warn!(
                    "[HistoryStore] Treating history for user '{}' as empty: {}",
                    self.user_id, e
                );
                Vec::new()
            }
        };
        &self.records
    }

    /// Prepends `record` and persists.
    ///
    /// # Errors
    ///
    /// - `InvalidRecord` if the record fails validation
    /// - `DuplicateId` if a record with the same id is already present
    /// - `Persistence` if the backend write fails
    ///
    /// On any error the collection is unchanged.
    pub fn insert(&mut self, record: IdentificationRecord) -> Result<&[IdentificationRecord]> {
        record.validate()?;
        if self.contains(&record.id) {
            return Err(FlutterlogError::DuplicateId(record.id));
        }

        let id = record.id.clone();
        let mut next = Vec::with_capacity(self.records.len() + 1);
        next.push(record);
        next.extend(self.records.iter().cloned());
        self.commit(next)?;

        info!("[HistoryStore] Inserted record '{}' for user '{}'", id, self.user_id);
        Ok(&self.records)
    }

    /// Removes the record with `id`. An unknown id is a no-op and performs no write.
    pub fn delete(&mut self, id: &str) -> Result<&[IdentificationRecord]> {
        if !self.contains(id) {
            debug!("[HistoryStore] Delete of unknown record '{}' ignored", id);
            return Ok(&self.records);
        }

        let next = self
            .records
            .iter()
            .filter(|record| record.id != id)
            .cloned()
            .collect();
        self.commit(next)?;

        info!("[HistoryStore] Deleted record '{}' for user '{}'", id, self.user_id);
        Ok(&self.records)
    }

    /// Sets the verification flag of one record.
    pub fn set_verified(&mut self, id: &str, verified: bool) -> Result<&IdentificationRecord> {
        let position = self
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| FlutterlogError::not_found("identification record", id))?;

        if self.records[position].verified != verified {
            let mut next = self.records.clone();
            next[position].verified = verified;
            self.commit(next)?;
            info!(
                "[HistoryStore] Record '{}' marked {}",
                id,
                if verified { "verified" } else { "unverified" }
            );
        }

        Ok(&self.records[position])
    }

    /// Saves the top prediction of a classifier result as a new record.
    pub fn record_classification(
        &mut self,
        result: &ClassificationResult,
        image_url: impl Into<String>,
    ) -> Result<&IdentificationRecord> {
        let record = result.to_record(image_url)?;
        self.insert(record)?;
        self.records
            .first()
            .ok_or_else(|| FlutterlogError::not_found("identification record", "<new>"))
    }

    /// Writes `defaults` when the collection is empty.
    ///
    /// Returns `Ok(true)` if seeding happened. Every default must pass
    /// validation and ids must be unique among the defaults.
    pub fn seed_if_empty(&mut self, defaults: Vec<IdentificationRecord>) -> Result<bool> {
        if !self.records.is_empty() {
            return Ok(false);
        }

        for (index, record) in defaults.iter().enumerate() {
            record.validate()?;
            if defaults[..index].iter().any(|other| other.id == record.id) {
                return Err(FlutterlogError::DuplicateId(record.id.clone()));
            }
        }

        let count = defaults.len();
        self.commit(defaults)?;
        info!(
            "[HistoryStore] Seeded {} records for user '{}'",
            count, self.user_id
        );
        Ok(true)
    }

    /// Removes the persisted collection entirely.
    pub fn clear(&mut self) -> Result<()> {
        self.backend
            .remove(&self.key)
            .map_err(|e| as_persistence(&self.key, e))?;
        self.records.clear();
        info!("[HistoryStore] Cleared history for user '{}'", self.user_id);
        Ok(())
    }

    pub fn filter(&self, mode: HistoryFilter) -> Vec<IdentificationRecord> {
        query::filter(&self.records, mode)
    }

    pub fn sort(&self, key: SortKey) -> Vec<IdentificationRecord> {
        query::sort(&self.records, key)
    }

    pub fn view(&self, mode: HistoryFilter, key: SortKey) -> Vec<IdentificationRecord> {
        query::view(&self.records, mode, key)
    }

    pub fn statistics(&self) -> HistoryStatistics {
        query::statistics(&self.records)
    }

    /// Pretty-printed JSON of the whole collection in its current order.
    pub fn export(&self) -> Result<String> {
        query::export(&self.records)
    }

    /// Persists `next` and, only on success, makes it the current collection.
    fn commit(&mut self, next: Vec<IdentificationRecord>) -> Result<()> {
        let serialized = serde_json::to_string(&next)?;
        self.backend
            .set(&self.key, &serialized)
            .map_err(|e| as_persistence(&self.key, e))?;
        debug!(
            "[HistoryStore] Persisted {} records under '{}'",
            next.len(),
            self.key
        );
        self.records = next;
        Ok(())
    }
}

fn as_persistence(key: &str, err: FlutterlogError) -> FlutterlogError {
    match err {
        FlutterlogError::Persistence { .. } => err,
        other => FlutterlogError::persistence(key, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::Prediction;
    use crate::history::demo_records;
    use crate::test_support::FlakyStore;

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    fn record(id: &str, species: &str, confidence: f64, verified: bool) -> IdentificationRecord {
        IdentificationRecord::new(species, confidence, "img.jpg")
            .with_id(id)
            .with_timestamp("2025-01-15T10:30:00Z")
            .with_verified(verified)
    }

    fn scenario_store(backend: &FlakyStore) -> HistoryStore<&FlakyStore> {
        let mut store = HistoryStore::open(backend, alice());
        store.insert(record("2", "BLUE MORPHO", 87.6, false)).unwrap();
        store.insert(record("1", "MONARCH", 94.2, true)).unwrap();
        store
    }

    fn ids(records: &[IdentificationRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_history_key_format() {
        assert_eq!(history_key(&alice()), "history:alice");
    }

    #[test]
    fn test_open_absent_key_is_empty() {
        let backend = FlakyStore::new();
        let store = HistoryStore::open(&backend, alice());
        assert!(store.records().is_empty());
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn test_malformed_value_loads_as_empty() {
        let backend = FlakyStore::with_entry("history:alice", "{not an array");
        let store = HistoryStore::open(&backend, alice());

        assert!(store.records().is_empty());
        // the bad value is left in place
        assert_eq!(backend.raw("history:alice").unwrap(), "{not an array");
    }

    #[test]
    fn test_read_collection_reports_storage_read_error() {
        let backend = FlakyStore::with_entry("history:alice", "[{\"id\": 1}]");
        let err = read_collection(&backend, "history:alice").unwrap_err();
        assert!(err.is_storage_read());
    }

    #[test]
    fn test_backend_read_failure_loads_as_empty() {
        let backend = FlakyStore::new();
        scenario_store(&backend);
        backend.fail_reads(true);

        let store = HistoryStore::open(&backend, alice());
        assert!(store.records().is_empty());
    }

    #[test]
    fn test_insert_prepends_and_persists() {
        let backend = FlakyStore::new();
        let store = scenario_store(&backend);

        assert_eq!(ids(store.records()), vec!["1", "2"]);
        assert_eq!(store.statistics().total, 2);

        let persisted = read_collection(&backend, "history:alice").unwrap().unwrap();
        assert_eq!(persisted, store.records());
    }

    #[test]
    fn test_insert_increments_total() {
        let backend = FlakyStore::new();
        let mut store = scenario_store(&backend);
        let before = store.statistics().total;

        store.insert(record("9", "QUEEN", 60.0, false)).unwrap();

        assert_eq!(store.statistics().total, before + 1);
        assert_eq!(store.records()[0].id, "9");
    }

    #[test]
    fn test_insert_duplicate_id_is_rejected() {
        let backend = FlakyStore::new();
        let mut store = scenario_store(&backend);
        let before = store.records().to_vec();
        let writes = backend.write_count();

        let err = store.insert(record("1", "QUEEN", 50.0, false)).unwrap_err();

        assert!(err.is_duplicate_id());
        assert_eq!(store.records(), before.as_slice());
        assert_eq!(backend.write_count(), writes);
    }

    #[test]
    fn test_insert_invalid_record_is_rejected() {
        let backend = FlakyStore::new();
        let mut store = HistoryStore::open(&backend, alice());

        let err = store.insert(record("1", "MONARCH", 140.0, false)).unwrap_err();
        assert!(matches!(err, FlutterlogError::InvalidRecord(_)));
        assert!(store.records().is_empty());
    }

    #[test]
    fn test_insert_then_delete_round_trip() {
        let backend = FlakyStore::new();
        let mut store = scenario_store(&backend);
        let before = store.records().to_vec();

        store.insert(record("fresh", "QUEEN", 55.0, false)).unwrap();
        store.delete("fresh").unwrap();

        assert_eq!(store.records(), before.as_slice());
    }

    #[test]
    fn test_insert_three_delete_two_scenario() {
        let backend = FlakyStore::new();
        let mut store = scenario_store(&backend);

        store.insert(record("3", "PAINTED LADY", 91.8, true)).unwrap();
        store.delete("2").unwrap();

        assert_eq!(ids(store.records()), vec!["3", "1"]);
        let reopened = HistoryStore::open(&backend, alice());
        assert_eq!(ids(reopened.records()), vec!["3", "1"]);
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let backend = FlakyStore::new();
        let mut store = scenario_store(&backend);
        let writes = backend.write_count();

        store.delete("missing").unwrap();

        assert_eq!(ids(store.records()), vec!["1", "2"]);
        assert_eq!(backend.write_count(), writes);
    }

    #[test]
    fn test_failed_write_rolls_back_insert() {
        let backend = FlakyStore::new();
        let mut store = scenario_store(&backend);
        backend.fail_writes(true);

        let err = store.insert(record("3", "QUEEN", 50.0, false)).unwrap_err();

        assert!(err.is_persistence());
        assert_eq!(ids(store.records()), vec!["1", "2"]);
    }

    #[test]
    fn test_failed_write_rolls_back_delete() {
        let backend = FlakyStore::new();
        let mut store = scenario_store(&backend);
        backend.fail_writes(true);

        assert!(store.delete("1").unwrap_err().is_persistence());
        assert_eq!(ids(store.records()), vec!["1", "2"]);

        backend.fail_writes(false);
        store.delete("1").unwrap();
        assert_eq!(ids(store.records()), vec!["2"]);
    }

    #[test]
    fn test_set_verified() {
        let backend = FlakyStore::new();
        let mut store = scenario_store(&backend);

        assert!(store.set_verified("2", true).unwrap().verified);
        assert_eq!(store.statistics().verified_count, 2);

        let reopened = HistoryStore::open(&backend, alice());
        assert!(reopened.get("2").unwrap().verified);
    }

    #[test]
    fn test_set_verified_unknown_id() {
        let backend = FlakyStore::new();
        let mut store = scenario_store(&backend);
        assert!(store.set_verified("nope", true).unwrap_err().is_not_found());
    }

    #[test]
    fn test_set_verified_rolls_back_on_write_failure() {
        let backend = FlakyStore::new();
        let mut store = scenario_store(&backend);
        backend.fail_writes(true);

        assert!(store.set_verified("2", true).is_err());
        assert!(!store.get("2").unwrap().verified);
    }

    #[test]
    fn test_record_classification() {
        let backend = FlakyStore::new();
        let mut store = scenario_store(&backend);
        let result = ClassificationResult {
            predictions: vec![Prediction::new("QUEEN", 77.0), Prediction::new("SOLDIER", 53.9)],
            processing_time: 1.4,
        };

        let saved = store.record_classification(&result, "upload.jpg").unwrap();
        assert_eq!(saved.species, "QUEEN");
        assert!(!saved.verified);
        assert_eq!(store.records().len(), 3);
        assert_eq!(store.records()[0].species, "QUEEN");
    }

    #[test]
    fn test_seed_if_empty() {
        let backend = FlakyStore::new();
        let mut store = HistoryStore::open(&backend, alice());

        assert!(store.seed_if_empty(demo_records()).unwrap());
        assert_eq!(store.records().len(), 3);
        assert!(!store.seed_if_empty(demo_records()).unwrap());
        assert_eq!(store.records().len(), 3);
    }

    #[test]
    fn test_seed_rejects_duplicate_defaults() {
        let backend = FlakyStore::new();
        let mut store = HistoryStore::open(&backend, alice());
        let defaults = vec![record("1", "A", 10.0, false), record("1", "B", 20.0, false)];

        assert!(store.seed_if_empty(defaults).unwrap_err().is_duplicate_id());
        assert!(store.records().is_empty());
    }

    #[test]
    fn test_clear_removes_key() {
        let backend = FlakyStore::new();
        let mut store = scenario_store(&backend);

        store.clear().unwrap();

        assert!(store.records().is_empty());
        assert!(backend.raw("history:alice").is_none());
    }

    #[test]
    fn test_users_are_isolated() {
        let backend = FlakyStore::new();
        scenario_store(&backend);

        let bob = HistoryStore::open(&backend, UserId::new("bob").unwrap());
        assert!(bob.records().is_empty());
    }

    #[test]
    fn test_load_round_trip_preserves_fields() {
        let backend = FlakyStore::new();
        let mut store = HistoryStore::open(&backend, alice());
        let detailed = record("7", "ZEBRA LONGWING", 66.25, true)
            .with_timestamp("2025-03-01T12:00:00.123+02:00")
            .with_location("Everglades")
            .with_notes("resting on passion vine");
        store.insert(detailed.clone()).unwrap();

        let reopened = HistoryStore::open(&backend, alice());
        assert_eq!(reopened.records(), &[detailed]);
    }

    #[test]
    fn test_reopen_preserves_confidence_bits() {
        let backend = FlakyStore::new();
        let mut store = HistoryStore::open(&backend, alice());
        store
            .insert(record("1", "MONARCH", 39.430133835633676, false))
            .unwrap();
        store.insert(record("2", "QUEEN", 0.1 + 0.2, false)).unwrap();

        let reopened = HistoryStore::open(&backend, alice());
        let bits: Vec<u64> = reopened
            .records()
            .iter()
            .map(|r| r.confidence.to_bits())
            .collect();
        assert_eq!(
            bits,
            vec![(0.1_f64 + 0.2).to_bits(), 39.430133835633676_f64.to_bits()]
        );
        assert_eq!(reopened.records(), store.records());
    }

    #[test]
    fn test_scenario_statistics_and_export() {
        let backend = FlakyStore::new();
        let store = scenario_store(&backend);

        let stats = store.statistics();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.unique_species, 2);
        assert_eq!(stats.verified_count, 1);
        assert_eq!(stats.average_confidence, 91);

        let exported: Vec<IdentificationRecord> =
            serde_json::from_str(&store.export().unwrap()).unwrap();
        assert_eq!(exported, store.records());
    }
}
