//! Configuration Module
//!
//! Loads the cache's extension points from environment variables. Everything
//! here is resolved once at startup and never re-read per call.

use std::env;
use std::str::FromStr;

use crate::cache::DEFAULT_VOLATILE_CAPACITY;
use crate::policy::DEFAULT_CACHEABLE_TYPES;

// == Backend Kind ==
/// Which storage backend implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Hidden records in the host's record store
    #[default]
    Durable,
    /// Process-local LRU object cache
    Volatile,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "durable" | "database" => Ok(BackendKind::Durable),
            "volatile" | "object" => Ok(BackendKind::Volatile),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

/// Field cache configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Content types whose items are cached
    pub cacheable_types: Vec<String>,
    /// Whether the options pseudo-entity is cached
    pub cache_options: bool,
    /// Storage backend implementation
    pub backend: BackendKind,
    /// Entity capacity of the volatile backend
    pub volatile_capacity: usize,
    /// Extra field keys external writes must never patch
    pub ignored_keys: Vec<String>,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHEABLE_TYPES` - Comma separated content types (default: post,page;
    ///   an empty value disables item caching)
    /// - `CACHE_OPTIONS` - Cache the options entity (default: true)
    /// - `STORAGE_BACKEND` - `durable` or `volatile` (default: durable)
    /// - `VOLATILE_CAPACITY` - Volatile backend capacity (default: 1000)
    /// - `IGNORED_KEYS` - Comma separated keys added to the ignore list
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cacheable_types: env::var("CACHEABLE_TYPES")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.cacheable_types),
            cache_options: env::var("CACHE_OPTIONS")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.cache_options),
            backend: env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.backend),
            volatile_capacity: env::var("VOLATILE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.volatile_capacity),
            ignored_keys: env::var("IGNORED_KEYS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.ignored_keys),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cacheable_types: DEFAULT_CACHEABLE_TYPES.iter().map(|t| t.to_string()).collect(),
            cache_options: true,
            backend: BackendKind::Durable,
            volatile_capacity: DEFAULT_VOLATILE_CAPACITY,
            ignored_keys: Vec::new(),
            server_port: 3000,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
