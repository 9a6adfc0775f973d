//! Coherence Module
//!
//! Keeps cached field maps consistent with the three write channels the host
//! reports: the canonical bulk save, out-of-band field writes and
//! out-of-band option writes.

mod engine;
mod events;
mod ignore;


pub use engine::CoherenceEngine;
pub use events::{EventBus, Handler, HookBus, SaveToken, Topic, WriteEvent, WriteOrigin};
pub use ignore::{IgnoreList, BUILTIN_IGNORED_KEYS};
