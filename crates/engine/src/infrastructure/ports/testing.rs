//! Testability ports for injecting time and randomness.

use chrono::{DateTime, Utc};

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait RandomPort: Send + Sync {
    /// Uniform float in `[0, upper)`.
    fn gen_float(&self, upper: f64) -> f64;
    /// Uniform index in `[0, len)`. `len` is never zero.
    fn gen_index(&self, len: usize) -> usize;
}
