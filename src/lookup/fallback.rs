//! Fallback source: the field provider when one is installed, raw attribute
//! reads otherwise.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::{EntityId, FieldMap, StatsRecorder};
use crate::host::{AttributeStore, FieldProvider};

#[derive(Clone)]
pub struct Fallback {
    provider: Option<Arc<dyn FieldProvider>>,
    attributes: Arc<dyn AttributeStore>,
    stats: Arc<StatsRecorder>,
}

impl Fallback {
    /// `provider` is resolved once here and never looked up again.
    pub fn new(
        provider: Option<Arc<dyn FieldProvider>>,
        attributes: Arc<dyn AttributeStore>,
        stats: Arc<StatsRecorder>,
    ) -> Self {
        Self {
            provider,
            attributes,
            stats,
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Reads one field from the slow, correct path.
    ///
    /// Without a provider this is a raw attribute read, which returns
    /// repeater and flexible-content data in its stored shape.
    pub fn value(&self, field: &str, entity: EntityId) -> Option<Value> {
        self.stats.record_fallback();
        match &self.provider {
            Some(provider) => provider.fetch_one(field, entity),
            None => self.attributes.get_single(entity, field),
        }
    }

    /// Fetches every field of `entity`. An entity without fields yields an
    /// empty map; `None` means no provider is installed.
    pub fn fetch_all(&self, entity: EntityId) -> Option<FieldMap> {
        let provider = self.provider.as_ref()?;
        self.stats.record_fallback();
        Some(provider.fetch_all(entity).unwrap_or_default())
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fallback")
            .field("has_provider", &self.has_provider())
            .finish_non_exhaustive()
    }
}
