//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area.
//! Use cases orchestrate across ports and the domain crate to fulfill user stories.

pub mod catalog;
pub mod generation;
pub mod roll;

// Re-export main types
pub use catalog::{CatalogOverview, CatalogSnapshot};
pub use generation::{GenerationError, GenerationProfile, GenerationService};
pub use roll::{RollClass, RollClassError};
