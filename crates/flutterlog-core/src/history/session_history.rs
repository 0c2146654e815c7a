//! Session-scoped access to the history store.

use super::model::{HistoryFilter, HistoryStatistics, IdentificationRecord, SortKey};
use super::store::HistoryStore;
use crate::classification::ClassificationResult;
use crate::error::Result;
use crate::kv::KeyValueStore;
use crate::session::UserSession;

const EMPTY: &[IdentificationRecord] = &[];

/// History access for whoever holds the current session.
///
/// With an authenticated session this forwards to a [`HistoryStore`]. With an
/// anonymous one there is no store at all: reads return an empty collection,
/// mutations succeed without touching the backend, and statistics are zero.
pub struct SessionHistory<S: KeyValueStore> {
    store: Option<HistoryStore<S>>,
}

impl<S: KeyValueStore> SessionHistory<S> {
    pub fn new(backend: S, session: &UserSession) -> Self {
        let store = session
            .user_id()
            .cloned()
            .map(|user_id| HistoryStore::open(backend, user_id));
        Self { store }
    }

    pub fn store(&self) -> Option<&HistoryStore<S>> {
        self.store.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.store.is_some()
    }

    pub fn records(&self) -> &[IdentificationRecord] {
        match self.store.as_ref() {
            Some(store) => store.records(),
            None => EMPTY,
        }
    }

    pub fn reload(&mut self) -> &[IdentificationRecord] {
        match self.store.as_mut() {
            Some(store) => store.load(),
            None => EMPTY,
        }
    }

    pub fn insert(&mut self, record: IdentificationRecord) -> Result<&[IdentificationRecord]> {
        match self.store.as_mut() {
            Some(store) => store.insert(record),
            None => Ok(EMPTY),
        }
    }

    pub fn delete(&mut self, id: &str) -> Result<&[IdentificationRecord]> {
        match self.store.as_mut() {
            Some(store) => store.delete(id),
            None => Ok(EMPTY),
        }
    }

    /// Returns `Ok(None)` for an anonymous session.
    pub fn set_verified(
        &mut self,
        id: &str,
        verified: bool,
    ) -> Result<Option<&IdentificationRecord>> {
        match self.store.as_mut() {
            Some(store) => store.set_verified(id, verified).map(Some),
            None => Ok(None),
        }
    }

    /// Returns `Ok(None)` for an anonymous session; the result is not kept.
    pub fn record_classification(
        &mut self,
        result: &ClassificationResult,
        image_url: impl Into<String>,
    ) -> Result<Option<&IdentificationRecord>> {
        match self.store.as_mut() {
            Some(store) => store.record_classification(result, image_url).map(Some),
            None => Ok(None),
        }
    }

    pub fn seed_if_empty(&mut self, defaults: Vec<IdentificationRecord>) -> Result<bool> {
        match self.store.as_mut() {
            Some(store) => store.seed_if_empty(defaults),
            None => Ok(false),
        }
    }

    pub fn clear(&mut self) -> Result<()> {
        match self.store.as_mut() {
            Some(store) => store.clear(),
            None => Ok(()),
        }
    }

    pub fn view(&self, mode: HistoryFilter, key: SortKey) -> Vec<IdentificationRecord> {
        self.store
            .as_ref()
            .map(|store| store.view(mode, key))
            .unwrap_or_default()
    }

    pub fn statistics(&self) -> HistoryStatistics {
        self.store
            .as_ref()
            .map(HistoryStore::statistics)
            .unwrap_or_default()
    }

    pub fn export(&self) -> Result<String> {
        super::query::export(self.records())
    }
}
