//! Coherence Engine
//!
//! Reacts to write events and keeps each entity's cached map in step with the
//! host. An entity moves from unknown to cached on its first bulk save (or
//! first lookup) and stays cached; only explicit events change it.

use std::sync::{Arc, Weak};

use dashmap::{DashMap, DashSet};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CachedFields, EntityId, StatsRecorder, StorageBackend};
use crate::coherence::{EventBus, Handler, IgnoreList, SaveToken, Topic, WriteEvent, WriteOrigin};
use crate::lookup::Fallback;
use crate::policy::CachePolicy;

// == Coherence Engine ==
pub struct CoherenceEngine {
    backend: Arc<dyn StorageBackend>,
    policy: CachePolicy,
    fallback: Fallback,
    bus: Arc<dyn EventBus>,
    ignored: IgnoreList,
    stats: Arc<StatsRecorder>,
    /// Bulk saves between their start and completion events
    in_flight: DashMap<SaveToken, EntityId>,
    /// Option keys of the cached options map that writes are patched into
    option_subscriptions: DashSet<String>,
    /// Option keys with a handler on the bus
    option_handlers: DashSet<String>,
    this: Weak<CoherenceEngine>,
}

impl CoherenceEngine {
    // == Constructor ==
    /// Builds the engine and registers it on `bus`.
    ///
    /// Option writes are subscribed per key, for the keys present in the
    /// cached options map right now. The set follows the map whenever the
    /// options entity is rebuilt, by a bulk save or by a first read.
    pub fn start(
        backend: Arc<dyn StorageBackend>,
        policy: CachePolicy,
        fallback: Fallback,
        bus: Arc<dyn EventBus>,
        ignored: IgnoreList,
        stats: Arc<StatsRecorder>,
    ) -> Arc<Self> {
        let engine = Arc::new_cyclic(|this| Self {
            backend,
            policy,
            fallback,
            bus,
            ignored,
            stats,
            in_flight: DashMap::new(),
            option_subscriptions: DashSet::new(),
            option_handlers: DashSet::new(),
            this: this.clone(),
        });

        for topic in [Topic::SaveStarted, Topic::FieldWritten, Topic::SaveCompleted] {
            engine.bus.subscribe(topic, engine.handler());
        }

        if engine.policy.caches_options() {
            if let Some(cached) = engine.backend.get(EntityId::Options) {
                engine.sync_options(&cached);
            }
        }

        info!(
            options = engine.option_subscriptions.len(),
            "coherence engine registered"
        );
        engine
    }

    fn handler(&self) -> Handler {
        let this = self.this.clone();
        Arc::new(move |event: &WriteEvent| {
            if let Some(engine) = this.upgrade() {
                engine.handle(event);
            }
        })
    }

    // == Event Dispatch ==
    pub fn handle(&self, event: &WriteEvent) {
        match event {
            WriteEvent::SaveStarted { entity, token } => self.on_save_started(*entity, *token),
            WriteEvent::SaveCompleted { entity, token } => {
                self.on_save_completed(*entity, *token);
            }
            WriteEvent::FieldWritten {
                entity,
                key,
                value,
                origin,
            } => {
                self.on_field_written(*entity, key, value, *origin);
            }
            WriteEvent::OptionWritten { key, value, origin } => {
                self.on_option_written(key, value, *origin);
            }
        }
    }

    // == Bulk Save ==
    /// Marks `entity` as mid-save so its field writes are left to the
    /// refresh that follows.
    pub fn on_save_started(&self, entity: EntityId, token: SaveToken) {
        debug!(%entity, %token, "bulk save started");
        self.in_flight.insert(token, entity);
    }

    /// Closes the transaction and rebuilds the entity's cache.
    pub fn on_save_completed(&self, entity: EntityId, token: SaveToken) -> Option<CachedFields> {
        if self.in_flight.remove(&token).is_none() {
            debug!(%entity, %token, "save completed without a start marker");
        }
        self.refresh(entity)
    }

    // == Refresh ==
    /// Replaces the cached map with the provider's full current map.
    ///
    /// Returns `None` when the policy rejects the entity or no provider is
    /// available to produce an authoritative map.
    pub fn refresh(&self, entity: EntityId) -> Option<CachedFields> {
        if !self.policy.should_cache(entity) {
            debug!(%entity, "refresh skipped: entity not cacheable");
            return None;
        }

        let Some(stored) = self.rebuild(entity) else {
            warn!(%entity, "refresh skipped: no field provider");
            return None;
        };
        self.stats.record_refresh();
        info!(%entity, fields = stored.keys().len(), "cache refreshed");
        Some(stored)
    }

    // == Populate ==
    /// Fills an entity that has nothing cached yet, on its first read.
    pub fn populate(&self, entity: EntityId) -> Option<CachedFields> {
        if !self.policy.should_cache(entity) {
            return None;
        }

        let stored = self.rebuild(entity)?;
        self.stats.record_lazy_fill();
        debug!(%entity, fields = stored.keys().len(), "cache populated on read");
        Some(stored)
    }

    fn rebuild(&self, entity: EntityId) -> Option<CachedFields> {
        let fields = self.fallback.fetch_all(entity)?;
        let stored = self.backend.put(entity, fields);
        if entity.is_options() {
            self.sync_options(&stored);
        }
        Some(stored)
    }

    // == External Field Write ==
    /// Patches one already-cached field after a write outside the bulk save.
    ///
    /// Returns true if the cache changed. The read-modify-write is not
    /// atomic: two concurrent writes to different fields of one entity can
    /// lose one of the updates.
    pub fn on_field_written(
        &self,
        entity: EntityId,
        key: &str,
        value: &Value,
        origin: WriteOrigin,
    ) -> bool {
        if self.is_part_of_save(entity, origin) {
            debug!(%entity, key, "field write skipped: part of a bulk save");
            return false;
        }
        if self.ignored.is_ignored(key) {
            debug!(%entity, key, "field write skipped: ignored key");
            return false;
        }
        if !self.policy.should_cache(entity) {
            debug!(%entity, key, "field write skipped: entity not cacheable");
            return false;
        }
        self.patch(entity, key, value)
    }

    // == External Option Write ==
    /// Patches one cached option after a write outside the bulk save.
    pub fn on_option_written(&self, key: &str, value: &Value, origin: WriteOrigin) -> bool {
        if let WriteOrigin::BulkSave(token) = origin {
            debug!(key, %token, "option write skipped: part of a bulk save");
            return false;
        }
        if !self.policy.caches_options() || !self.option_subscriptions.contains(key) {
            return false;
        }
        if self.ignored.is_ignored(key) {
            return false;
        }
        self.patch(EntityId::Options, key, value)
    }

    /// Only keys already in the cached map are patched; new keys wait for
    /// the next full rebuild.
    fn patch(&self, entity: EntityId, key: &str, value: &Value) -> bool {
        let Some(CachedFields::Fields(mut fields)) = self.backend.get(entity) else {
            debug!(%entity, key, "patch skipped: no cached fields");
            return false;
        };

        match fields.get(key) {
            None => {
                debug!(%entity, key, "patch skipped: field not cached");
                return false;
            }
            Some(current) if current == value => return false,
            Some(_) => {}
        }

        fields.insert(key.to_string(), value.clone());
        self.backend.put(entity, fields);
        self.stats.record_patch();
        debug!(%entity, key, "cached field patched");
        true
    }

    fn is_part_of_save(&self, entity: EntityId, origin: WriteOrigin) -> bool {
        if let WriteOrigin::BulkSave(token) = origin {
            if self.in_flight.contains_key(&token) {
                return true;
            }
        }
        self.is_saving(entity)
    }

    /// Returns true while any bulk save of `entity` is open.
    pub fn is_saving(&self, entity: EntityId) -> bool {
        self.in_flight.iter().any(|save| *save.value() == entity)
    }

    /// Makes the subscribed option keys match `cached`.
    fn sync_options(&self, cached: &CachedFields) {
        let keys: Vec<String> = cached
            .keys()
            .into_iter()
            .filter(|key| !self.ignored.is_ignored(key))
            .collect();

        self.option_subscriptions.retain(|key| keys.contains(key));
        for key in keys {
            self.option_subscriptions.insert(key.clone());
            // HookBus has no unsubscribe; a dropped key keeps its handler
            // but is no longer patched
            if self.option_handlers.insert(key.clone()) {
                self.bus.subscribe(Topic::Option(key), self.handler());
            }
        }
    }

    /// Option keys currently monitored, sorted.
    pub fn subscribed_options(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .option_subscriptions
            .iter()
            .map(|k| k.key().clone())
            .collect();
        keys.sort();
        keys
    }
}
