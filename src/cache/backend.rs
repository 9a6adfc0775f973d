//! Storage Backend Module
//!
//! The contract every cache backend satisfies.

use serde_json::Value;

use crate::cache::{CachedFields, EntityId, FieldMap};

// == Cache Lookup ==
/// Outcome of resolving one field against the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Field found in the cached map
    Hit(Value),
    /// Entity cached, but this field is not part of its map
    MissingField,
    /// Entity cached as having no fields at all
    NoFields,
    /// Entity never processed
    Uncached,
}

// == Storage Backend ==
/// Key-value store of entity field maps.
///
/// Absence is lazy: `get` reports a miss and never fetches from the field
/// provider itself. Populating on a miss is the caller's decision.
pub trait StorageBackend: Send + Sync {
    /// Stores `fields` for `entity`, writing the `NoFields` marker when the
    /// map is empty. Returns what was actually stored.
    fn put(&self, entity: EntityId, fields: FieldMap) -> CachedFields;

    /// Returns the cached representation, or `None` if the entity was never
    /// processed (or storage could not be read).
    fn get(&self, entity: EntityId) -> Option<CachedFields>;

    /// Number of entities held in this process.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves one field, keeping the miss reasons apart.
    fn lookup(&self, field: &str, entity: EntityId) -> CacheLookup {
        match self.get(entity) {
            None => CacheLookup::Uncached,
            Some(CachedFields::NoFields) => CacheLookup::NoFields,
            Some(CachedFields::Fields(map)) => match map.get(field) {
                Some(value) => CacheLookup::Hit(value.clone()),
                None => CacheLookup::MissingField,
            },
        }
    }

    /// Returns the cached value of `field`, or `None` when the entity has no
    /// fields or the field is not cached.
    fn get_value(&self, field: &str, entity: EntityId) -> Option<Value> {
        match self.lookup(field, entity) {
            CacheLookup::Hit(value) => Some(value),
            _ => None,
        }
    }
}
