//! Shared fixtures for unit and property tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::cache::{CachedFields, DurableBackend, EntityId, FieldMap, StatsRecorder, StorageBackend};
use crate::coherence::{CoherenceEngine, HookBus, IgnoreList};
use crate::host::{FieldProvider, MemoryHost};
use crate::lookup::{Fallback, FieldLookup};
use crate::policy::CachePolicy;

pub fn fields(pairs: &[(&str, Value)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Durable backend that counts calls made through the trait.
pub struct CountingBackend {
    inner: DurableBackend,
    puts: AtomicUsize,
    gets: AtomicUsize,
}

impl CountingBackend {
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

impl StorageBackend for CountingBackend {
    fn put(&self, entity: EntityId, fields: FieldMap) -> CachedFields {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(entity, fields)
    }

    fn get(&self, entity: EntityId) -> Option<CachedFields> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(entity)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

/// A wired engine and lookup over a [`MemoryHost`] where item 42 is a post.
pub struct Fixture {
    pub host: Arc<MemoryHost>,
    pub bus: Arc<HookBus>,
    pub backend: Arc<CountingBackend>,
    pub engine: Arc<CoherenceEngine>,
    pub lookup: FieldLookup,
    pub stats: Arc<StatsRecorder>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::on_host(Arc::new(MemoryHost::new()))
    }

    pub fn on_host(host: Arc<MemoryHost>) -> Self {
        Self::build(host, |policy| policy, &[])
    }

    pub fn with_ignored(extra: &[&str]) -> Self {
        Self::build(Arc::new(MemoryHost::new()), |policy| policy, extra)
    }

    pub fn without_provider() -> Self {
        Self::assemble(Arc::new(MemoryHost::new()), |policy| policy, &[], false)
    }

    pub fn build<F>(host: Arc<MemoryHost>, configure: F, extra_ignored: &[&str]) -> Self
    where
        F: FnOnce(CachePolicy) -> CachePolicy,
    {
        Self::assemble(host, configure, extra_ignored, true)
    }

    fn assemble<F>(
        host: Arc<MemoryHost>,
        configure: F,
        extra_ignored: &[&str],
        with_provider: bool,
    ) -> Self
    where
        F: FnOnce(CachePolicy) -> CachePolicy,
    {
        host.register_entity(42, "post");

        let stats = Arc::new(StatsRecorder::new());
        let bus = Arc::new(HookBus::new());
        let backend = Arc::new(CountingBackend {
            inner: DurableBackend::new(host.clone()),
            puts: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
        });
        let policy = configure(CachePolicy::new(host.clone(), ["post", "page"], true));
        let provider: Option<Arc<dyn FieldProvider>> = if with_provider {
            Some(host.clone() as Arc<dyn FieldProvider>)
        } else {
            None
        };
        let fallback = Fallback::new(provider, host.clone(), stats.clone());

        let engine = CoherenceEngine::start(
            backend.clone(),
            policy.clone(),
            fallback.clone(),
            bus.clone(),
            IgnoreList::new(extra_ignored.iter().copied()),
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
            host,
            bus,
            backend,
            engine,
            lookup,
            stats,
        }
    }

    /// Runs a canonical bulk save of item `id`.
    pub fn save(&self, id: u64, pairs: &[(&str, Value)]) {
        self.host.save(self.bus.as_ref(), EntityId::Item(id), fields(pairs));
    }
}
