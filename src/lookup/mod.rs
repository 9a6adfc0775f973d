//! Lookup Module
//!
//! The public read path: single-field lookups served from the cache, with
//! a fallback that is always correct but expensive.

mod facade;
mod fallback;

pub use facade::{FieldLookup, RenderMode};
pub use fallback::Fallback;
