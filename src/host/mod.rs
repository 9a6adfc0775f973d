//! Host Module
//!
//! Capabilities the field cache consumes from the content framework it sits
//! in front of. Each is a trait so deployments plug in their own binding;
//! [`MemoryHost`] implements all of them in-process.

mod memory;

pub use memory::MemoryHost;

use serde_json::Value;

use crate::cache::{EntityId, FieldMap};
use crate::error::StoreError;

// == Field Provider ==
/// The authoritative (and expensive) source of field values.
///
/// Optional: when a deployment has no provider the lookup facade reads raw
/// attributes instead.
pub trait FieldProvider: Send + Sync {
    /// Every field value for `entity`. `None` when the entity has none.
    fn fetch_all(&self, entity: EntityId) -> Option<FieldMap>;

    /// A single field value.
    fn fetch_one(&self, field: &str, entity: EntityId) -> Option<Value>;
}

// == Attribute Store ==
/// Raw single-value attribute reads.
///
/// Multi-valued structures (repeaters, flexible content) are returned as
/// stored, not reconstructed into their field shape.
pub trait AttributeStore: Send + Sync {
    fn get_single(&self, entity: EntityId, key: &str) -> Option<Value>;
}

// == Entity Type Resolver ==
/// Resolves the content type of an item, e.g. `post` or `page`.
pub trait EntityTypeResolver: Send + Sync {
    fn type_of(&self, entity: EntityId) -> Option<String>;
}

// == Record Store ==
/// Durable per-entity key-value records backing [`crate::cache::DurableBackend`].
pub trait RecordStore: Send + Sync {
    fn read(&self, entity: EntityId, key: &str) -> Result<Option<Value>, StoreError>;

    fn write(&self, entity: EntityId, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Keys starting with an underscore are hidden bookkeeping, not field data.
pub fn is_hidden_key(key: &str) -> bool {
    key.starts_with('_')
}
