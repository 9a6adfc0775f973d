//! Volatile Backend Module
//!
//! Process-local object cache. Nothing is persisted; once an entity is
//! evicted it reads as absent and gets repopulated on the next lookup.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::cache::{CachedFields, EntityId, FieldMap, LruTracker, StorageBackend};

#[derive(Debug, Default)]
struct VolatileInner {
    entries: HashMap<EntityId, CachedFields>,
    lru: LruTracker<EntityId>,
    evictions: u64,
}

// == Volatile Backend ==
/// Bounded in-memory backend with LRU eviction.
#[derive(Debug)]
pub struct VolatileBackend {
    inner: Mutex<VolatileInner>,
    capacity: usize,
}

impl VolatileBackend {
    // == Constructor ==
    /// Creates a backend holding at most `capacity` entities (minimum one).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VolatileInner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entities evicted so far.
    pub fn evictions(&self) -> u64 {
        self.lock().evictions
    }

    fn lock(&self) -> MutexGuard<'_, VolatileInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageBackend for VolatileBackend {
    fn put(&self, entity: EntityId, fields: FieldMap) -> CachedFields {
        let stored = CachedFields::from_map(fields);
        let mut inner = self.lock();

        let is_overwrite = inner.entries.contains_key(&entity);
        if !is_overwrite && inner.entries.len() >= self.capacity {
            if let Some(evicted) = inner.lru.evict_oldest() {
                inner.entries.remove(&evicted);
                inner.evictions += 1;
                debug!(%evicted, "volatile cache evicted entity");
            }
        }

        inner.entries.insert(entity, stored.clone());
        inner.lru.touch(&entity);
        stored
    }

    fn get(&self, entity: EntityId) -> Option<CachedFields> {
        let mut inner = self.lock();
        let cached = inner.entries.get(&entity).cloned()?;
        inner.lru.touch(&entity);
        Some(cached)
    }

    fn len(&self) -> usize {
        self.lock().entries.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn one(key: &str, value: serde_json::Value) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(key.to_string(), value);
        map
    }

    #[test]
    fn test_put_and_get() {
        let backend = VolatileBackend::new(10);
        backend.put(EntityId::Item(1), one("a", json!(1)));

        assert_eq!(backend.get_value("a", EntityId::Item(1)), Some(json!(1)));
        assert!(backend.get(EntityId::Item(2)).is_none());
    }

    #[test]
    fn test_no_fields_marker() {
        let backend = VolatileBackend::new(10);
        assert!(backend.put(EntityId::Item(1), FieldMap::new()).is_no_fields());
        assert_eq!(backend.get(EntityId::Item(1)), Some(CachedFields::NoFields));
    }

    #[test]
    fn test_lru_eviction() {
        let backend = VolatileBackend::new(2);
        backend.put(EntityId::Item(1), one("a", json!(1)));
        backend.put(EntityId::Item(2), one("a", json!(2)));

        // Reading 1 makes 2 the eviction candidate
        backend.get(EntityId::Item(1));
        backend.put(EntityId::Item(3), one("a", json!(3)));

        assert_eq!(backend.len(), 2);
        assert_eq!(backend.evictions(), 1);
        assert!(backend.get(EntityId::Item(2)).is_none());
        assert!(backend.get(EntityId::Item(1)).is_some());
        assert!(backend.get(EntityId::Item(3)).is_some());
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let backend = VolatileBackend::new(1);
        backend.put(EntityId::Item(1), one("a", json!(1)));
        backend.put(EntityId::Item(1), one("a", json!(2)));

        assert_eq!(backend.evictions(), 0);
        assert_eq!(backend.get_value("a", EntityId::Item(1)), Some(json!(2)));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let backend = VolatileBackend::new(0);
        assert_eq!(backend.capacity(), 1);
        backend.put(EntityId::Options, one("logo", json!("a.png")));
        assert_eq!(backend.len(), 1);
    }
}
