//! Cache Module
//!
//! Per-entity field map storage: the sentinel-aware data model, the storage
//! backend contract and its durable and volatile implementations.

mod backend;
mod durable;
mod entity;
mod lru;
mod stats;
mod volatile;

// Re-export public types
pub use backend::{CacheLookup, StorageBackend};
pub use durable::DurableBackend;
pub use entity::{CachedFields, EntityId, FieldMap, ParseEntityIdError, OPTIONS_ALIASES};
pub use lru::LruTracker;
pub use stats::{CacheStats, StatsRecorder};
pub use volatile::VolatileBackend;

// == Public Constants ==
/// Record key under which the durable backend stores an item's field map.
///
/// The leading underscore keeps it out of attribute enumeration and exports.
pub const ITEM_CACHE_KEY: &str = "_qf_field_cache";

/// Record key holding the options pseudo-entity's field map.
pub const OPTIONS_CACHE_KEY: &str = "_qf_options_cache";

/// Default number of entities the volatile backend keeps before evicting
pub const DEFAULT_VOLATILE_CAPACITY: usize = 1000;
