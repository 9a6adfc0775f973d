//! Cache Policy Module
//!
//! Decides whether an entity's fields are cached at all.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::cache::EntityId;
use crate::config::Config;
use crate::host::EntityTypeResolver;

/// Content types cached when nothing overrides the allow-list.
pub const DEFAULT_CACHEABLE_TYPES: [&str; 2] = ["post", "page"];

// == Cache Policy ==
/// Allow-list of content types plus the options toggle.
///
/// Overrides are applied while building the policy; a built policy is an
/// immutable decision function.
#[derive(Clone)]
pub struct CachePolicy {
    cacheable_types: BTreeSet<String>,
    cache_options: bool,
    resolver: Arc<dyn EntityTypeResolver>,
}

impl CachePolicy {
    pub fn new<I, S>(
        resolver: Arc<dyn EntityTypeResolver>,
        cacheable_types: I,
        cache_options: bool,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cacheable_types: cacheable_types.into_iter().map(Into::into).collect(),
            cache_options,
            resolver,
        }
    }

    pub fn from_config(config: &Config, resolver: Arc<dyn EntityTypeResolver>) -> Self {
        Self::new(resolver, config.cacheable_types.clone(), config.cache_options)
    }

    /// Extension point: rewrites the allow-list once.
    pub fn filter_types<F>(mut self, filter: F) -> Self
    where
        F: FnOnce(Vec<String>) -> Vec<String>,
    {
        let current = self.cacheable_types.into_iter().collect();
        self.cacheable_types = filter(current).into_iter().collect();
        self
    }

    /// Extension point: rewrites the options toggle once.
    pub fn filter_options<F>(mut self, filter: F) -> Self
    where
        F: FnOnce(bool) -> bool,
    {
        self.cache_options = filter(self.cache_options);
        self
    }

    // == Should Cache ==
    /// Returns true if `entity` takes part in caching.
    ///
    /// Items whose type cannot be resolved are never cached.
    pub fn should_cache(&self, entity: EntityId) -> bool {
        match entity {
            EntityId::Options => self.cache_options,
            EntityId::Item(_) => self
                .resolver
                .type_of(entity)
                .is_some_and(|entity_type| self.cacheable_types.contains(&entity_type)),
        }
    }

    pub fn caches_options(&self) -> bool {
        self.cache_options
    }

    pub fn cacheable_types(&self) -> impl Iterator<Item = &str> {
        self.cacheable_types.iter().map(String::as_str)
    }
}

impl fmt::Debug for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachePolicy")
            .field("cacheable_types", &self.cacheable_types)
            .field("cache_options", &self.cache_options)
            .finish_non_exhaustive()
    }
}
