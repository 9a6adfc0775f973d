//! Lookup Facade
//!
//! `get_field` composes the cache policy, the storage backend and the
//! fallback. Cache-layer problems never reach the caller: at worst a value is
//! served from the fallback, or is stale.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheLookup, EntityId, StatsRecorder, StorageBackend};
use crate::coherence::CoherenceEngine;
use crate::lookup::Fallback;
use crate::policy::CachePolicy;

/// Whether the caller is rendering published content or a draft preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    Live,
    /// Unsaved values may differ from the cache, so it is bypassed
    Preview,
}

impl RenderMode {
    pub fn from_preview(preview: bool) -> Self {
        if preview {
            RenderMode::Preview
        } else {
            RenderMode::Live
        }
    }
}

// == Field Lookup ==
#[derive(Clone)]
pub struct FieldLookup {
    backend: Arc<dyn StorageBackend>,
    policy: CachePolicy,
    fallback: Fallback,
    engine: Arc<CoherenceEngine>,
    stats: Arc<StatsRecorder>,
}

impl FieldLookup {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        policy: CachePolicy,
        fallback: Fallback,
        engine: Arc<CoherenceEngine>,
        stats: Arc<StatsRecorder>,
    ) -> Self {
        Self {
            backend,
            policy,
            fallback,
            engine,
            stats,
        }
    }

    // == Get Field ==
    /// Resolves `field` for `entity`.
    ///
    /// - Preview renders and uncacheable entities go straight to the fallback.
    /// - A cached value is returned as is.
    /// - A field missing from a cached map, or from an entity cached as
    ///   having no fields, is read from the fallback.
    /// - An uncached entity is populated with one full fetch first, then
    ///   answered as if it had been cached already.
    pub fn get_field(&self, field: &str, entity: EntityId, mode: RenderMode) -> Option<Value> {
        if mode == RenderMode::Preview {
            debug!(%entity, field, "preview render: cache bypassed");
            return self.fallback.value(field, entity);
        }
        if !self.policy.should_cache(entity) {
            return self.fallback.value(field, entity);
        }

        match self.backend.lookup(field, entity) {
            CacheLookup::Hit(value) => {
                self.stats.record_hit();
                Some(value)
            }
            CacheLookup::NoFields | CacheLookup::MissingField => {
                self.stats.record_miss();
                self.fallback.value(field, entity)
            }
            CacheLookup::Uncached => {
                self.stats.record_miss();
                self.populate(field, entity)
            }
        }
    }

    fn populate(&self, field: &str, entity: EntityId) -> Option<Value> {
        self.engine
            .populate(entity)
            .and_then(|stored| stored.get(field).cloned())
            .or_else(|| self.fallback.value(field, entity))
    }
}
