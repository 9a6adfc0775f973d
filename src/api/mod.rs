//! API Module
//!
//! HTTP surface through which a host delivers writes and asks for fields.
//!
//! # Endpoints
//! - `PUT /entities/:id` - Register an item and its content type
//! - `POST /entities/:id/save` - Run the canonical bulk save
//! - `PUT /entities/:id/fields/:key` - Write one field outside the save flow
//! - `GET /entities/:id/fields/:key` - Look up one field (`?preview=true` bypasses the cache)
//! - `PUT /options/:key` - Write one option outside the save flow
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
