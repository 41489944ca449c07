//! API layer - HTTP entry points.

pub mod http;
pub mod middleware;

pub use http::{build_router, routes, ApiError};
