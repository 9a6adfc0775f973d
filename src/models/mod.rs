//! Request and Response models for the host surface
//!
//! DTOs serialized to and from HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{FieldQuery, RegisterEntityRequest, SaveRequest, WriteRequest};
pub use responses::{
    EntityResponse, ErrorResponse, FieldResponse, HealthResponse, SaveResponse, StatsResponse,
    WriteResponse,
};
