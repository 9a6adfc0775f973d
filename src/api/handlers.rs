//! API Handlers
//!
//! HTTP request handlers for each endpoint of the host surface.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::EntityId;
use crate::coherence::HookBus;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::field_cache::{Collaborators, FieldCache};
use crate::host::MemoryHost;
use crate::lookup::RenderMode;
use crate::models::{
    EntityResponse, FieldQuery, FieldResponse, HealthResponse, RegisterEntityRequest,
    SaveRequest, SaveResponse, StatsResponse, WriteRequest, WriteResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<FieldCache>,
    pub host: Arc<MemoryHost>,
    pub bus: Arc<HookBus>,
}

impl AppState {
    /// Wires a field cache onto an in-memory host.
    pub fn new(config: &Config, host: Arc<MemoryHost>) -> Self {
        let bus = Arc::new(HookBus::new());
        let cache = FieldCache::new(config, Collaborators::from_host(host.clone(), bus.clone()));
        Self {
            cache: Arc::new(cache),
            host,
            bus,
        }
    }

    /// Creates a new AppState from configuration with an empty host.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config, Arc::new(MemoryHost::new()))
    }

    fn known_entity(&self, raw: &str) -> Result<EntityId> {
        let entity: EntityId = raw.parse()?;
        if !self.host.contains(entity) {
            return Err(CacheError::UnknownEntity(raw.to_string()));
        }
        Ok(entity)
    }
}

/// Handler for PUT /entities/:id
pub async fn register_entity_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RegisterEntityRequest>,
) -> Result<Json<EntityResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let item = match id.parse::<EntityId>()? {
        EntityId::Item(item) => item,
        EntityId::Options => {
            return Err(CacheError::InvalidRequest(
                "The options entity has no content type".to_string(),
            ))
        }
    };

    let entity_type = req.entity_type.trim().to_string();
    state.host.register_entity(item, entity_type.clone());

    Ok(Json(EntityResponse {
        entity: EntityId::Item(item),
        entity_type,
    }))
}

/// Handler for POST /entities/:id/save
pub async fn save_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<SaveResponse>> {
    let entity = state.known_entity(&id)?;
    let token = state.host.save(state.bus.as_ref(), entity, req.fields);

    Ok(Json(SaveResponse {
        entity,
        token,
        cached: state.cache.cached(entity),
    }))
}

/// Handler for PUT /entities/:id/fields/:key
pub async fn write_field_handler(
    State(state): State<AppState>,
    Path((id, key)): Path<(String, String)>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<WriteResponse>> {
    let entity = state.known_entity(&id)?;
    state
        .host
        .write_field(state.bus.as_ref(), entity, &key, req.value);

    Ok(Json(write_response(&state, entity, key)))
}

/// Handler for PUT /options/:key
pub async fn write_option_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<WriteResponse>> {
    state.host.write_option(state.bus.as_ref(), &key, req.value);

    Ok(Json(write_response(&state, EntityId::Options, key)))
}

fn write_response(state: &AppState, entity: EntityId, key: String) -> WriteResponse {
    let cached = state
        .cache
        .cached(entity)
        .and_then(|fields| fields.get(&key).cloned());
    WriteResponse {
        entity,
        key,
        cached,
    }
}

/// Handler for GET /entities/:id/fields/:key
///
/// Lookups never fail once the entity id parses; a missing value is `null`.
pub async fn get_field_handler(
    State(state): State<AppState>,
    Path((id, key)): Path<(String, String)>,
    Query(query): Query<FieldQuery>,
) -> Result<Json<FieldResponse>> {
    let entity: EntityId = id.parse()?;
    let value = state
        .cache
        .get_field(&key, entity, RenderMode::from_preview(query.preview));

    Ok(Json(FieldResponse::new(entity, key, value)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
