//! Entity Module
//!
//! Entity identifiers and the cached representation of an entity's fields.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Field key to value. Values may be nested (repeaters, groups).
pub type FieldMap = BTreeMap<String, Value>;

/// Strings that address the options pseudo-entity.
pub const OPTIONS_ALIASES: [&str; 2] = ["option", "options"];

// == Entity Id ==
/// Identifies a content item or the singleton options pseudo-entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EntityId {
    /// The site-wide options page
    Options,
    /// An ordinary content item
    Item(u64),
}

impl EntityId {
    /// Returns true for the options pseudo-entity.
    pub fn is_options(&self) -> bool {
        matches!(self, EntityId::Options)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Options => f.write_str("options"),
            EntityId::Item(id) => write!(f, "{}", id),
        }
    }
}

/// Raised when a string names neither the options entity nor a numeric item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid entity id: {0:?}")]
pub struct ParseEntityIdError(pub String);

impl FromStr for EntityId {
    type Err = ParseEntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if OPTIONS_ALIASES.contains(&trimmed) {
            return Ok(EntityId::Options);
        }
        trimmed
            .parse::<u64>()
            .map(EntityId::Item)
            .map_err(|_| ParseEntityIdError(s.to_string()))
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        EntityId::Item(id)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for EntityId {
    type Error = ParseEntityIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// == Cached Fields ==
/// What the cache holds for an entity that has been processed.
///
/// `NoFields` is the "checked, found nothing" marker. It is its own variant so
/// it can never be mistaken for field data; "never checked" is the absence of
/// any `CachedFields` at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "fields", rename_all = "snake_case")]
pub enum CachedFields {
    /// Entity was processed and has zero fields
    NoFields,
    /// Every field value known for the entity
    Fields(FieldMap),
}

impl CachedFields {
    /// Wraps a fetched map, collapsing an empty map into `NoFields`.
    pub fn from_map(fields: FieldMap) -> Self {
        if fields.is_empty() {
            CachedFields::NoFields
        } else {
            CachedFields::Fields(fields)
        }
    }

    /// Looks up a single field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            CachedFields::NoFields => None,
            CachedFields::Fields(map) => map.get(field),
        }
    }

    /// Returns the underlying map, if any fields exist.
    pub fn fields(&self) -> Option<&FieldMap> {
        match self {
            CachedFields::NoFields => None,
            CachedFields::Fields(map) => Some(map),
        }
    }

    /// Returns true for the checked-and-empty marker.
    pub fn is_no_fields(&self) -> bool {
        matches!(self, CachedFields::NoFields)
    }

    /// Field keys currently cached, in key order.
    pub fn keys(&self) -> Vec<String> {
        self.fields()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_options_aliases() {
        assert_eq!("options".parse::<EntityId>(), Ok(EntityId::Options));
        assert_eq!("option".parse::<EntityId>(), Ok(EntityId::Options));
        assert_eq!(" options ".parse::<EntityId>(), Ok(EntityId::Options));
    }

    #[test]
    fn test_parse_item() {
        assert_eq!("42".parse::<EntityId>(), Ok(EntityId::Item(42)));
        assert!("Options".parse::<EntityId>().is_err());
        assert!("-1".parse::<EntityId>().is_err());
        assert!("".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_entity_id_serializes_as_string() {
        assert_eq!(serde_json::to_value(EntityId::Item(7)).unwrap(), json!("7"));
        assert_eq!(
            serde_json::to_value(EntityId::Options).unwrap(),
            json!("options")
        );
        let parsed: EntityId = serde_json::from_value(json!("option")).unwrap();
        assert_eq!(parsed, EntityId::Options);
    }

    #[test]
    fn test_empty_map_becomes_no_fields() {
        assert_eq!(CachedFields::from_map(FieldMap::new()), CachedFields::NoFields);
    }

    #[test]
    fn test_no_fields_is_distinct_from_string_data() {
        // A field map holding the marker's own name is still field data
        let mut map = FieldMap::new();
        map.insert("state".to_string(), json!("no_fields"));
        let cached = CachedFields::from_map(map);

        assert!(!cached.is_no_fields());
        assert_eq!(cached.get("state"), Some(&json!("no_fields")));
    }

    #[test]
    fn test_persisted_layout() {
        let none = serde_json::to_value(CachedFields::NoFields).unwrap();
        assert_eq!(none, json!({"state": "no_fields"}));

        let mut map = FieldMap::new();
        map.insert("title".to_string(), json!("Hi"));
        let some = serde_json::to_value(CachedFields::Fields(map.clone())).unwrap();
        assert_eq!(some, json!({"state": "fields", "fields": {"title": "Hi"}}));

        let back: CachedFields = serde_json::from_value(some).unwrap();
        assert_eq!(back, CachedFields::Fields(map));
    }

    #[test]
    fn test_keys() {
        let mut map = FieldMap::new();
        map.insert("b".to_string(), json!(1));
        map.insert("a".to_string(), json!(2));
        assert_eq!(CachedFields::Fields(map).keys(), vec!["a", "b"]);
        assert!(CachedFields::NoFields.keys().is_empty());
    }
}
