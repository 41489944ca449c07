//! External service port traits (generative text, rate limiting).

use std::time::Duration;

use async_trait::async_trait;

use super::error::LlmError;

// =============================================================================
// Generative Text
// =============================================================================

/// Sampling parameters sent with every generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct TextGenerationRequest {
    /// Full prompt, including any output-format instructions
    pub prompt: String,
    pub params: SamplingParams,
    /// Upper bound on the whole upstream exchange
    pub timeout: Duration,
}

impl TextGenerationRequest {
    pub fn new(prompt: impl Into<String>, params: SamplingParams, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            params,
            timeout,
        }
    }
}

/// Single-shot text generation against a hosted model.
///
/// Implementations return the raw text of the first candidate and never retry.
#[async_trait]
pub trait TextGenerationPort: Send + Sync {
    /// Whether a credential is present. Callers check this before generating.
    fn is_configured(&self) -> bool;

    async fn generate(&self, request: TextGenerationRequest) -> Result<String, LlmError>;
}

// =============================================================================
// Rate Limiting
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Rejected { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Per-caller admission control.
///
/// `check_and_increment` must be atomic per key: two concurrent calls for the
/// same caller can never both observe the last free slot.
#[cfg_attr(test, mockall::automock)]
pub trait RateLimiter: Send + Sync {
    fn check_and_increment(&self, key: &str) -> RateDecision;
}
