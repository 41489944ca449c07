//! LoreForge Shared - Wire contract for the backend HTTP surface
//!
//! This crate contains the types exchanged between the engine and its clients:
//! - Request bodies (`requests`)
//! - Success and failure envelopes (`responses`)
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, chrono, and the domain crate
//! 2. **No business logic** - Pure data types and serialization
//! 3. **camelCase on the wire** - field names match what the mobile client sends and reads

pub mod requests;
pub mod responses;

pub use requests::{GenerateClassRequest, GenerateStoryRequest, RollClassRequest};
pub use responses::{
    CatalogSummaryResponse, ClassPayload, EndpointIndex, ErrorResponse, ErrorType,
    GenerateClassResponse, GenerateStoryResponse, HealthResponse, RollClassResponse,
    ServiceInfoResponse,
};
