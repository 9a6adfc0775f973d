//! Durable Backend Module
//!
//! Persists field maps as hidden records in the host's record store and
//! memoizes them for the lifetime of the process.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::cache::{
    CachedFields, EntityId, FieldMap, StorageBackend, ITEM_CACHE_KEY, OPTIONS_CACHE_KEY,
};
use crate::error::StoreError;
use crate::host::RecordStore;

// == Durable Backend ==
/// Record-store backed cache with an in-process memo in front of it.
///
/// The memo is filled on first read or write of an entity and never evicted.
/// Store failures are logged and treated as absence; nothing is retried.
pub struct DurableBackend {
    records: Arc<dyn RecordStore>,
    memo: DashMap<EntityId, CachedFields>,
}

impl DurableBackend {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self {
            records,
            memo: DashMap::new(),
        }
    }

    /// Record key used for an entity. Options live under their own key.
    pub fn record_key(entity: EntityId) -> &'static str {
        if entity.is_options() {
            OPTIONS_CACHE_KEY
        } else {
            ITEM_CACHE_KEY
        }
    }

    fn persist(&self, entity: EntityId, stored: &CachedFields) -> Result<(), StoreError> {
        let encoded = serde_json::to_value(stored)?;
        self.records.write(entity, Self::record_key(entity), encoded)
    }

    fn load(&self, entity: EntityId) -> Result<Option<CachedFields>, StoreError> {
        match self.records.read(entity, Self::record_key(entity))? {
            Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
            None => Ok(None),
        }
    }
}

impl StorageBackend for DurableBackend {
    fn put(&self, entity: EntityId, fields: FieldMap) -> CachedFields {
        let stored = CachedFields::from_map(fields);
        if let Err(err) = self.persist(entity, &stored) {
            warn!(%entity, error = %err, "failed to persist cache record");
        }
        self.memo.insert(entity, stored.clone());
        debug!(%entity, no_fields = stored.is_no_fields(), "cache record stored");
        stored
    }

    fn get(&self, entity: EntityId) -> Option<CachedFields> {
        if let Some(cached) = self.memo.get(&entity) {
            return Some(cached.value().clone());
        }

        let cached = match self.load(entity) {
            Ok(cached) => cached?,
            Err(err) => {
                warn!(%entity, error = %err, "cache record unreadable, treating as absent");
                return None;
            }
        };
        self.memo.insert(entity, cached.clone());
        Some(cached)
    }

    fn len(&self) -> usize {
        self.memo.len()
    }
}
