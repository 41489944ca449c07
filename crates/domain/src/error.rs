//! Unified error types for the domain layer
//!
//! Rolling and composing never fall back to a default tier on failure; every
//! degenerate input surfaces here and the caller chooses a recovery policy.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// The rarity table (or other configuration) cannot be used
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No theme or role is available even after falling back to the full catalog
    #[error("No candidates available: {themes} themes, {roles} roles")]
    NoCandidates { themes: usize, roles: usize },
}

impl DomainError {
    /// Creates a configuration error.
    ///
    /// Use this when a caller-supplied table cannot produce a valid result:
    /// - The weight table is empty
    /// - Every weight is zero
    /// - A weight is negative or not finite
    ///
    /// # Example
    /// ```ignore
    /// if total <= 0.0 {
    ///     return Err(DomainError::configuration("Rarity weights sum to zero"));
    /// }
    /// ```
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a no-candidates error from the post-fallback set sizes
    pub fn no_candidates(themes: usize, roles: usize) -> Self {
        Self::NoCandidates { themes, roles }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_no_candidates(&self) -> bool {
        matches!(self, Self::NoCandidates { .. })
    }
}
