//! Request DTOs for the host surface

use serde::Deserialize;
use serde_json::Value;

use crate::cache::FieldMap;

/// Request body for `PUT /entities/:id`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterEntityRequest {
    /// Content type, e.g. `post`
    pub entity_type: String,
}

impl RegisterEntityRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.entity_type.trim().is_empty() {
            return Some("Entity type cannot be empty".to_string());
        }
        None
    }
}

/// Request body for `POST /entities/:id/save`
#[derive(Debug, Clone, Deserialize)]
pub struct SaveRequest {
    /// Every field value written by the save
    #[serde(default)]
    pub fields: FieldMap,
}

/// Request body for single field and option writes
#[derive(Debug, Clone, Deserialize)]
pub struct WriteRequest {
    pub value: Value,
}

/// Query string for field lookups
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldQuery {
    /// Render as a draft preview, bypassing the cache
    #[serde(default)]
    pub preview: bool,
}
