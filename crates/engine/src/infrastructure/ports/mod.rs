//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Catalog access (could swap SQLite -> Firestore)
//! - Generative text (could swap Gemini -> another hosted model)
//! - Rate limiting (could swap in-memory -> shared store)
//! - Clock/Random (for testing)

mod error;
mod external;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{CatalogCounts, CatalogImport, CatalogRepo};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    RateDecision, RateLimiter, SamplingParams, TextGenerationPort, TextGenerationRequest,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::MockCatalogRepo;

#[cfg(test)]
pub use external::MockRateLimiter;

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{LlmError, RepoError};
