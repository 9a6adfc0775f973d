//! Write events and the bus that delivers them.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::EntityId;

// == Save Token ==
/// Correlates every event belonging to one bulk-save transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveToken(u64);

impl SaveToken {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SaveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "save-{}", self.0)
    }
}

/// Where a value write came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
    /// Part of the given bulk-save transaction
    BulkSave(SaveToken),
    /// Any other write path
    External,
}

// == Write Event ==
#[derive(Debug, Clone, PartialEq)]
pub enum WriteEvent {
    /// Fired before any field of the transaction is written
    SaveStarted { entity: EntityId, token: SaveToken },
    /// A single item field was persisted
    FieldWritten {
        entity: EntityId,
        key: String,
        value: Value,
        origin: WriteOrigin,
    },
    /// Fired after every field of the transaction is written
    SaveCompleted { entity: EntityId, token: SaveToken },
    /// A single option was persisted
    OptionWritten {
        key: String,
        value: Value,
        origin: WriteOrigin,
    },
}

impl WriteEvent {
    /// The topic subscribers must listen on to receive this event.
    pub fn topic(&self) -> Topic {
        match self {
            WriteEvent::SaveStarted { .. } => Topic::SaveStarted,
            WriteEvent::FieldWritten { .. } => Topic::FieldWritten,
            WriteEvent::SaveCompleted { .. } => Topic::SaveCompleted,
            WriteEvent::OptionWritten { key, .. } => Topic::Option(key.clone()),
        }
    }
}

/// Subscription key. Option writes are published per option key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    SaveStarted,
    FieldWritten,
    SaveCompleted,
    Option(String),
}

pub type Handler = Arc<dyn Fn(&WriteEvent) + Send + Sync>;

// == Event Bus ==
/// The host's hook mechanism.
///
/// Implementations must deliver a transaction's `SaveStarted` before its
/// field writes and `SaveCompleted` after them.
pub trait EventBus: Send + Sync {
    fn subscribe(&self, topic: Topic, handler: Handler);

    /// Invokes every handler registered for the event's topic, in
    /// registration order. Returns how many ran.
    fn dispatch(&self, event: &WriteEvent) -> usize;
}

// == Hook Bus ==
/// In-process synchronous event bus.
#[derive(Default)]
pub struct HookBus {
    handlers: DashMap<Topic, Vec<Handler>>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.handlers.get(topic).map(|h| h.len()).unwrap_or(0)
    }
}

impl EventBus for HookBus {
    fn subscribe(&self, topic: Topic, handler: Handler) {
        self.handlers.entry(topic).or_default().push(handler);
    }

    fn dispatch(&self, event: &WriteEvent) -> usize {
        // Handlers may subscribe while running; release the shard first
        let handlers = match self.handlers.get(&event.topic()) {
            Some(handlers) => handlers.value().clone(),
            None => return 0,
        };

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }
}

impl fmt::Debug for HookBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookBus")
            .field("topics", &self.handlers.len())
            .finish()
    }
}
