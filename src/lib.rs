//! quickfield - a read-through cache for per-entity custom field data
//!
//! Serves single-field lookups from a denormalized "all fields of entity X"
//! cache, keeps that cache coherent as fields are written through the
//! canonical save flow and out-of-band paths, and falls back to the
//! expensive field provider whenever the cache cannot answer.

pub mod api;
pub mod cache;
pub mod coherence;
pub mod config;
pub mod error;
pub mod field_cache;
pub mod host;
pub mod lookup;
pub mod models;
pub mod policy;

#[cfg(test)]
mod testing;

pub use api::AppState;
pub use cache::{CachedFields, EntityId, FieldMap};
pub use config::Config;
pub use field_cache::{Collaborators, FieldCache};
pub use lookup::RenderMode;
