//! Response envelopes returned by the HTTP surface.
//!
//! Every endpoint answers with `success: true` plus its payload, or with an
//! [`ErrorResponse`] carrying `success: false`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loreforge_domain::{GeneratedClass, RarityWeights};

// =============================================================================
// Payloads
// =============================================================================

/// Validated class payload produced by the generative API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPayload {
    pub name: String,
    pub rarity: String,
    pub description: String,
}

// =============================================================================
// Success envelopes
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateClassResponse {
    pub success: bool,
    pub class: ClassPayload,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl GenerateClassResponse {
    pub fn new(class: ClassPayload, request_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            class,
            request_id: request_id.into(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateStoryResponse {
    pub success: bool,
    /// Cleaned JSON text exactly as the model produced it
    pub story: String,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl GenerateStoryResponse {
    pub fn new(story: impl Into<String>, request_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            story: story.into(),
            request_id: request_id.into(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollClassResponse {
    pub success: bool,
    pub class: GeneratedClass,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl RollClassResponse {
    pub fn new(class: GeneratedClass, request_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            class,
            request_id: request_id.into(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub gemini_configured: bool,
}

/// Endpoint index shown on `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointIndex {
    pub health: String,
    pub generate_class: String,
    pub generate_story: String,
    pub roll_class: String,
    pub catalog: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfoResponse {
    pub message: String,
    pub status: String,
    pub version: String,
    pub endpoints: EndpointIndex,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummaryResponse {
    pub themes: u64,
    pub roles: u64,
    /// Distinct theme × role pairs
    pub combinations: u64,
    pub rarity_weights: RarityWeights,
}

// =============================================================================
// Failure envelope
// =============================================================================

/// Error classification carried in `errorType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorType {
    ConfigurationError,
    NoCandidatesError,
    MalformedResponseError,
    InvalidSchemaError,
    RateLimitedError,
    TimeoutError,
    UpstreamError,
    InvalidRequestError,
    StorageError,
    /// Unknown error type for forward compatibility
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    /// Human-readable message
    pub error: String,
    pub error_type: ErrorType,
    /// Seconds the caller should wait before retrying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Diagnostic detail, development mode only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Unparseable model output, development mode only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl ErrorResponse {
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            error_type,
            retry_after: None,
            request_id: None,
            details: None,
            raw_response: None,
        }
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_raw_response(mut self, raw: impl Into<String>) -> Self {
        self.raw_response = Some(raw.into());
        self
    }
}
