//! In-memory host.
//!
//! Stands in for the content framework: entity types, raw attributes, field
//! registrations and the write flows that emit [`WriteEvent`]s.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::cache::{EntityId, FieldMap};
use crate::coherence::{EventBus, SaveToken, WriteEvent, WriteOrigin};
use crate::error::StoreError;
use crate::host::{is_hidden_key, AttributeStore, EntityTypeResolver, FieldProvider, RecordStore};

#[derive(Debug, Default)]
pub struct MemoryHost {
    /// Content type per item
    types: DashMap<u64, String>,
    /// Raw attributes per entity, hidden records included
    attributes: DashMap<EntityId, FieldMap>,
    /// Keys the field provider treats as fields, per entity
    registered: DashMap<EntityId, BTreeSet<String>>,
    next_token: AtomicU64,
    fetch_all_calls: AtomicU64,
    fetch_one_calls: AtomicU64,
    records_failing: AtomicBool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an item with its content type.
    pub fn register_entity(&self, id: u64, entity_type: impl Into<String>) {
        self.types.insert(id, entity_type.into());
    }

    /// Returns true if the entity exists. The options entity always does.
    pub fn contains(&self, entity: EntityId) -> bool {
        match entity {
            EntityId::Options => true,
            EntityId::Item(id) => self.types.contains_key(&id),
        }
    }

    /// Writes a raw attribute without emitting any event.
    pub fn write_attribute(&self, entity: EntityId, key: &str, value: Value) {
        self.attributes
            .entry(entity)
            .or_default()
            .insert(key.to_string(), value);
    }

    pub fn attribute(&self, entity: EntityId, key: &str) -> Option<Value> {
        self.attributes
            .get(&entity)
            .and_then(|attrs| attrs.get(key).cloned())
    }

    /// Attribute keys visible to enumeration and export.
    pub fn visible_keys(&self, entity: EntityId) -> Vec<String> {
        self.attributes
            .get(&entity)
            .map(|attrs| {
                attrs
                    .keys()
                    .filter(|key| !is_hidden_key(key))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Marks `key` as a field of `entity` without writing a value.
    pub fn register_field(&self, entity: EntityId, key: &str) {
        self.registered
            .entry(entity)
            .or_default()
            .insert(key.to_string());
    }

    /// Opens a save transaction.
    pub fn begin_save(&self) -> SaveToken {
        SaveToken::new(self.next_token.fetch_add(1, Ordering::Relaxed) + 1)
    }

    // == Canonical Save ==
    /// Runs the editor's bulk-save flow: the start marker, one write per
    /// field tagged with the transaction, then the completion event.
    pub fn save(&self, bus: &dyn EventBus, entity: EntityId, fields: FieldMap) -> SaveToken {
        let token = self.begin_save();
        debug!(%entity, ?token, fields = fields.len(), "bulk save");

        bus.dispatch(&WriteEvent::SaveStarted { entity, token });
        for (key, value) in fields {
            self.register_field(entity, &key);
            self.emit_write(bus, entity, key, value, WriteOrigin::BulkSave(token));
        }
        bus.dispatch(&WriteEvent::SaveCompleted { entity, token });

        token
    }

    // == External Writes ==
    /// Writes one value outside the editor flow, e.g. from an import job.
    pub fn write_field(&self, bus: &dyn EventBus, entity: EntityId, key: &str, value: Value) {
        self.emit_write(bus, entity, key.to_string(), value, WriteOrigin::External);
    }

    /// Writes one option outside the editor flow.
    pub fn write_option(&self, bus: &dyn EventBus, key: &str, value: Value) {
        self.write_field(bus, EntityId::Options, key, value);
    }

    fn emit_write(
        &self,
        bus: &dyn EventBus,
        entity: EntityId,
        key: String,
        value: Value,
        origin: WriteOrigin,
    ) {
        self.write_attribute(entity, &key, value.clone());
        let event = match entity {
            EntityId::Options => WriteEvent::OptionWritten { key, value, origin },
            EntityId::Item(_) => WriteEvent::FieldWritten {
                entity,
                key,
                value,
                origin,
            },
        };
        bus.dispatch(&event);
    }

    // == Test Hooks ==
    /// Makes every record read and write fail until cleared.
    pub fn set_records_failing(&self, failing: bool) {
        self.records_failing.store(failing, Ordering::Relaxed);
    }

    pub fn fetch_all_calls(&self) -> u64 {
        self.fetch_all_calls.load(Ordering::Relaxed)
    }

    pub fn fetch_one_calls(&self) -> u64 {
        self.fetch_one_calls.load(Ordering::Relaxed)
    }

    /// Total calls made to the field provider.
    pub fn provider_calls(&self) -> u64 {
        self.fetch_all_calls() + self.fetch_one_calls()
    }

    fn check_records(&self) -> Result<(), StoreError> {
        if self.records_failing.load(Ordering::Relaxed) {
            Err(StoreError::Unavailable("memory host records disabled".into()))
        } else {
            Ok(())
        }
    }
}

impl FieldProvider for MemoryHost {
    fn fetch_all(&self, entity: EntityId) -> Option<FieldMap> {
        self.fetch_all_calls.fetch_add(1, Ordering::Relaxed);
        let keys = self.registered.get(&entity)?;
        let fields: FieldMap = keys
            .iter()
            .filter_map(|key| self.attribute(entity, key).map(|v| (key.clone(), v)))
            .collect();
        (!fields.is_empty()).then_some(fields)
    }

    fn fetch_one(&self, field: &str, entity: EntityId) -> Option<Value> {
        self.fetch_one_calls.fetch_add(1, Ordering::Relaxed);
        self.attribute(entity, field)
    }
}

impl AttributeStore for MemoryHost {
    fn get_single(&self, entity: EntityId, key: &str) -> Option<Value> {
        self.attribute(entity, key)
    }
}

impl EntityTypeResolver for MemoryHost {
    fn type_of(&self, entity: EntityId) -> Option<String> {
        match entity {
            EntityId::Options => None,
            EntityId::Item(id) => self.types.get(&id).map(|t| t.value().clone()),
        }
    }
}

impl RecordStore for MemoryHost {
    fn read(&self, entity: EntityId, key: &str) -> Result<Option<Value>, StoreError> {
        self.check_records()?;
        Ok(self.attribute(entity, key))
    }

    fn write(&self, entity: EntityId, key: &str, value: Value) -> Result<(), StoreError> {
        self.check_records()?;
        self.write_attribute(entity, key, value);
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::coherence::HookBus;
    use serde_json::json;

    #[test]
    fn test_fetch_all_only_returns_registered_fields() {
        let host = MemoryHost::new();
        let entity = EntityId::Item(1);
        host.register_field(entity, "title");
        host.write_attribute(entity, "title", json!("Hi"));
        host.write_attribute(entity, "views", json!(12));

        let fields = host.fetch_all(entity).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["title"], json!("Hi"));
        assert_eq!(host.fetch_all_calls(), 1);
    }

    #[test]
    fn test_fetch_all_without_fields_is_none() {
        let host = MemoryHost::new();
        assert!(host.fetch_all(EntityId::Item(3)).is_none());
    }

    #[test]
    fn test_hidden_keys_are_not_visible() {
        let host = MemoryHost::new();
        let entity = EntityId::Item(1);
        host.write_attribute(entity, "color", json!("red"));
        host.write_attribute(entity, "_qf_field_cache", json!({"state": "no_fields"}));

        assert_eq!(host.visible_keys(entity), vec!["color"]);
    }

    #[test]
    fn test_records_can_fail() {
        let host = MemoryHost::new();
        host.set_records_failing(true);
        assert!(host.read(EntityId::Item(1), "_k").is_err());
        assert!(RecordStore::write(&host, EntityId::Item(1), "_k", json!(1)).is_err());

        host.set_records_failing(false);
        assert!(RecordStore::write(&host, EntityId::Item(1), "_k", json!(1)).is_ok());
        assert_eq!(host.read(EntityId::Item(1), "_k").unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_save_emits_ordered_events() {
        use std::sync::{Arc, Mutex};

        let host = MemoryHost::new();
        let bus = HookBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for topic in [
            crate::coherence::Topic::SaveStarted,
            crate::coherence::Topic::FieldWritten,
            crate::coherence::Topic::SaveCompleted,
        ] {
            let seen = seen.clone();
            bus.subscribe(
                topic,
                Arc::new(move |event: &WriteEvent| seen.lock().unwrap().push(event.clone())),
            );
        }

        let mut fields = FieldMap::new();
        fields.insert("title".into(), json!("Hi"));
        let token = host.save(&bus, EntityId::Item(9), fields);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(
            seen[0],
            WriteEvent::SaveStarted {
                entity: EntityId::Item(9),
                token
            }
        );
        assert!(matches!(
            &seen[1],
            WriteEvent::FieldWritten { origin: WriteOrigin::BulkSave(t), .. } if *t == token
        ));
        assert!(matches!(seen[2], WriteEvent::SaveCompleted { .. }));
    }

    #[test]
    fn test_tokens_are_unique() {
        let host = MemoryHost::new();
        assert_ne!(host.begin_save(), host.begin_save());
    }
}
