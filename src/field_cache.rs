//! Field Cache
//!
//! Wires a storage backend, the cache policy, the coherence engine and the
//! lookup facade from a [`Config`] and the host's collaborators.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::cache::{
    CacheStats, CachedFields, DurableBackend, EntityId, StatsRecorder, StorageBackend,
    VolatileBackend,
};
use crate::coherence::{CoherenceEngine, EventBus, IgnoreList};
use crate::config::{BackendKind, Config};
use crate::host::{AttributeStore, EntityTypeResolver, FieldProvider, MemoryHost, RecordStore};
use crate::lookup::{Fallback, FieldLookup, RenderMode};
use crate::policy::CachePolicy;

// == Collaborators ==
/// Host capabilities injected into the cache.
#[derive(Clone)]
pub struct Collaborators {
    pub bus: Arc<dyn EventBus>,
    pub resolver: Arc<dyn EntityTypeResolver>,
    pub attributes: Arc<dyn AttributeStore>,
    pub records: Arc<dyn RecordStore>,
    /// `None` when the deployment has no field provider
    pub provider: Option<Arc<dyn FieldProvider>>,
}

impl Collaborators {
    /// Uses `host` for every capability.
    pub fn from_host(host: Arc<MemoryHost>, bus: Arc<dyn EventBus>) -> Self {
        Self {
            bus,
            resolver: host.clone(),
            attributes: host.clone(),
            records: host.clone(),
            provider: Some(host as Arc<dyn FieldProvider>),
        }
    }
}

// == Field Cache ==
pub struct FieldCache {
    backend: Arc<dyn StorageBackend>,
    engine: Arc<CoherenceEngine>,
    lookup: FieldLookup,
    stats: Arc<StatsRecorder>,
}

impl FieldCache {
    /// Builds every component and registers the engine on the bus.
    pub fn new(config: &Config, collaborators: Collaborators) -> Self {
        let backend: Arc<dyn StorageBackend> = match config.backend {
            BackendKind::Durable => Arc::new(DurableBackend::new(collaborators.records.clone())),
            BackendKind::Volatile => Arc::new(VolatileBackend::new(config.volatile_capacity)),
        };
        Self::with_policy(
            config,
            backend,
            CachePolicy::from_config(config, collaborators.resolver.clone()),
            collaborators,
        )
    }

    /// Like [`FieldCache::new`] with an explicit backend and policy, for
    /// deployments that customise the extension points in code.
    pub fn with_policy(
        config: &Config,
        backend: Arc<dyn StorageBackend>,
        policy: CachePolicy,
        collaborators: Collaborators,
    ) -> Self {
        let stats = Arc::new(StatsRecorder::new());
        let fallback = Fallback::new(
            collaborators.provider,
            collaborators.attributes,
            stats.clone(),
        );

        info!(
            backend = ?config.backend,
            types = ?policy.cacheable_types().collect::<Vec<_>>(),
            cache_options = policy.caches_options(),
            provider = fallback.has_provider(),
            "field cache starting"
        );

        let engine = CoherenceEngine::start(
            backend.clone(),
            policy.clone(),
            fallback.clone(),
            collaborators.bus,
            IgnoreList::new(config.ignored_keys.iter().cloned()),
            stats.clone(),
        );
        let lookup = FieldLookup::new(
            backend.clone(),
            policy,
            fallback,
            engine.clone(),
            stats.clone(),
        );

        Self {
            backend,
            engine,
            lookup,
            stats,
        }
    }

    pub fn get_field(&self, field: &str, entity: EntityId, mode: RenderMode) -> Option<Value> {
        self.lookup.get_field(field, entity, mode)
    }

    /// What the cache currently holds for `entity`.
    pub fn cached(&self, entity: EntityId) -> Option<CachedFields> {
        self.backend.get(entity)
    }

    pub fn engine(&self) -> &Arc<CoherenceEngine> {
        &self.engine
    }

    pub fn lookup(&self) -> &FieldLookup {
        &self.lookup
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.backend.len())
    }
}
