//! Response DTOs for the host surface

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, CachedFields, EntityId};
use crate::coherence::SaveToken;

/// Response body for `GET /entities/:id/fields/:key`
#[derive(Debug, Clone, Serialize)]
pub struct FieldResponse {
    pub entity: EntityId,
    pub field: String,
    /// `null` when the field has no value
    pub value: Option<Value>,
}

impl FieldResponse {
    pub fn new(entity: EntityId, field: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            entity,
            field: field.into(),
            value,
        }
    }
}

/// Response body for `PUT /entities/:id`
#[derive(Debug, Clone, Serialize)]
pub struct EntityResponse {
    pub entity: EntityId,
    pub entity_type: String,
}

/// Response body for `POST /entities/:id/save`
#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    pub entity: EntityId,
    pub token: SaveToken,
    /// Cache contents after the save, absent if the entity is not cached
    pub cached: Option<CachedFields>,
}

/// Response body for external field and option writes
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    pub entity: EntityId,
    pub key: String,
    /// Value the cache now holds for the key, if it tracks it
    pub cached: Option<Value>,
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        let hit_rate = stats.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_response_serialize() {
        let resp = FieldResponse::new(EntityId::Item(42), "color", Some(json!("blue")));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"entity": "42", "field": "color", "value": "blue"}));
    }

    #[test]
    fn test_missing_value_is_null() {
        let resp = FieldResponse::new(EntityId::Options, "logo", None);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["value"], Value::Null);
        assert_eq!(json["entity"], json!("options"));
    }

    #[test]
    fn test_stats_response_is_flat() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        let json = serde_json::to_value(StatsResponse::from(stats)).unwrap();
        assert_eq!(json["hits"], json!(3));
        assert_eq!(json["hit_rate"], json!(0.75));
    }

    #[test]
    fn test_save_response_serialize() {
        let resp = SaveResponse {
            entity: EntityId::Item(1),
            token: SaveToken::new(5),
            cached: Some(CachedFields::NoFields),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["token"], json!(5));
        assert_eq!(json["cached"], json!({"state": "no_fields"}));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("Something went wrong"));
    }
}
