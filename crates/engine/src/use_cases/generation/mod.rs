//! Generative augmentation proxy.
//!
//! Wraps a caller prompt with a JSON-only instruction, sends it to the text
//! generation port, and turns whatever comes back into either a validated
//! payload or a classified [`GenerationError`]. There is no internal retry.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use loreforge_shared::ClassPayload;
use serde_json::Value;

use crate::infrastructure::correlation::RequestId;
use crate::infrastructure::ports::{
    LlmError, SamplingParams, TextGenerationPort, TextGenerationRequest,
};

/// Appended to every prompt before it is sent upstream.
pub const STRICT_JSON_SUFFIX: &str =
    "\n\nRespond ONLY with valid JSON. Do not include any text outside the JSON object.";

static JSON_FENCE_REGEX: OnceLock<regex_lite::Regex> = OnceLock::new();
static BARE_FENCE_REGEX: OnceLock<regex_lite::Regex> = OnceLock::new();

/// Sampling parameters and time bound for one kind of generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationProfile {
    pub params: SamplingParams,
    pub timeout: Duration,
}

impl GenerationProfile {
    /// Short class payloads.
    pub const CLASS: Self = Self {
        params: SamplingParams {
            temperature: 0.9,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 200,
        },
        timeout: Duration::from_secs(30),
    };

    /// Longer story payloads.
    pub const STORY: Self = Self {
        params: SamplingParams {
            temperature: 0.8,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 400,
        },
        timeout: Duration::from_secs(45),
    };
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("Prompt is required")]
    MissingPrompt,

    #[error("Gemini API key not configured")]
    NotConfigured,

    #[error("Gemini API took longer than {}s to respond", .0.as_secs())]
    Timeout(Duration),

    #[error("Gemini API rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },

    #[error("Gemini API error: {message}")]
    Upstream { status: Option<u16>, message: String },

    /// `raw` is the cleaned model text that failed to parse.
    #[error("Invalid JSON response from Gemini API: {parser_message}")]
    MalformedResponse { raw: String, parser_message: String },

    #[error("Invalid class data structure from API: missing {}", .missing.join(", "))]
    InvalidSchema { missing: Vec<&'static str> },
}

impl From<LlmError> for GenerationError {
    fn from(error: LlmError) -> Self {
        match error {
            LlmError::NotConfigured => GenerationError::NotConfigured,
            LlmError::Timeout(after) => GenerationError::Timeout(after),
            LlmError::RateLimited { retry_after_secs } => {
                GenerationError::RateLimited { retry_after_secs }
            }
            LlmError::Status { status, message } => GenerationError::Upstream {
                status: Some(status),
                message,
            },
            LlmError::RequestFailed(message) | LlmError::InvalidResponse(message) => {
                GenerationError::Upstream {
                    status: None,
                    message,
                }
            }
            LlmError::EmptyResponse => GenerationError::Upstream {
                status: None,
                message: "No response from Gemini API".to_string(),
            },
        }
    }
}

/// Runs class and story prompts through the generative API.
pub struct GenerationService {
    llm: Arc<dyn TextGenerationPort>,
    class_profile: GenerationProfile,
    story_profile: GenerationProfile,
}

impl GenerationService {
    pub fn new(llm: Arc<dyn TextGenerationPort>) -> Self {
        Self {
            llm,
            class_profile: GenerationProfile::CLASS,
            story_profile: GenerationProfile::STORY,
        }
    }

    pub fn with_class_profile(mut self, profile: GenerationProfile) -> Self {
        self.class_profile = profile;
        self
    }

    pub fn with_story_profile(mut self, profile: GenerationProfile) -> Self {
        self.story_profile = profile;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_configured()
    }

    /// Generate and validate a `{name, rarity, description}` payload.
    pub async fn generate_class(
        &self,
        prompt: Option<&str>,
        request_id: &RequestId,
    ) -> Result<ClassPayload, GenerationError> {
        let cleaned = self
            .request_json_text(prompt, self.class_profile, request_id, "class")
            .await?;
        let payload = parse_class_payload(&cleaned);

        match &payload {
            Ok(class) => tracing::info!(
                request_id = %request_id.short(),
                name = %class.name,
                rarity = %class.rarity,
                outcome = "success",
                "Generated class"
            ),
            Err(e) => tracing::warn!(
                request_id = %request_id.short(),
                outcome = outcome_label(e),
                error = %e,
                "Class generation rejected"
            ),
        }

        payload
    }

    /// Generate a story and return the cleaned JSON text verbatim.
    pub async fn generate_story(
        &self,
        prompt: Option<&str>,
        request_id: &RequestId,
    ) -> Result<String, GenerationError> {
        let cleaned = self
            .request_json_text(prompt, self.story_profile, request_id, "story")
            .await?;

        if let Err(e) = serde_json::from_str::<Value>(&cleaned) {
            let error = GenerationError::MalformedResponse {
                raw: cleaned,
                parser_message: e.to_string(),
            };
            tracing::warn!(
                request_id = %request_id.short(),
                outcome = outcome_label(&error),
                "Story response is not JSON"
            );
            return Err(error);
        }

        tracing::info!(request_id = %request_id.short(), outcome = "success", "Generated story");
        Ok(cleaned)
    }

    /// Shared pipeline up to and including fence stripping.
    async fn request_json_text(
        &self,
        prompt: Option<&str>,
        profile: GenerationProfile,
        request_id: &RequestId,
        kind: &'static str,
    ) -> Result<String, GenerationError> {
        let prompt = prompt
            .filter(|p| !p.trim().is_empty())
            .ok_or(GenerationError::MissingPrompt)?;

        if !self.llm.is_configured() {
            tracing::error!(request_id = %request_id.short(), kind, "Gemini API key not configured");
            return Err(GenerationError::NotConfigured);
        }

        let request = TextGenerationRequest::new(
            format!("{}{}", prompt, STRICT_JSON_SUFFIX),
            profile.params,
            profile.timeout,
        );

        tracing::debug!(request_id = %request_id.short(), kind, "Sending prompt to Gemini");

        let result = match tokio::time::timeout(profile.timeout, self.llm.generate(request)).await {
            Ok(result) => result.map_err(GenerationError::from),
            Err(_) => Err(GenerationError::Timeout(profile.timeout)),
        };

        match result {
            Ok(text) => Ok(strip_code_fences(&text)),
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id.short(),
                    kind,
                    outcome = outcome_label(&e),
                    error = %e,
                    "Gemini request failed"
                );
                Err(e)
            }
        }
    }
}

/// Remove Markdown code fences (```` ```json ```` first, then bare ```` ``` ````) and trim.
pub fn strip_code_fences(text: &str) -> String {
    let json_fence = JSON_FENCE_REGEX.get_or_init(|| {
        regex_lite::Regex::new(r"(?i)```json\n?").expect("JSON_FENCE_REGEX pattern is invalid")
    });
    let bare_fence = BARE_FENCE_REGEX.get_or_init(|| {
        regex_lite::Regex::new(r"```\n?").expect("BARE_FENCE_REGEX pattern is invalid")
    });

    let without_json = json_fence.replace_all(text, "");
    bare_fence.replace_all(&without_json, "").trim().to_string()
}

/// Parse cleaned text and require non-empty string `name`, `rarity`, `description`.
pub fn parse_class_payload(cleaned: &str) -> Result<ClassPayload, GenerationError> {
    let parsed: Value =
        serde_json::from_str(cleaned).map_err(|e| GenerationError::MalformedResponse {
            raw: cleaned.to_string(),
            parser_message: e.to_string(),
        })?;

    let field = |key: &str| {
        parsed
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    match (field("name"), field("rarity"), field("description")) {
        (Some(name), Some(rarity), Some(description)) => Ok(ClassPayload {
            name,
            rarity,
            description,
        }),
        (name, rarity, description) => {
            let missing = [
                ("name", name.is_none()),
                ("rarity", rarity.is_none()),
                ("description", description.is_none()),
            ]
            .into_iter()
            .filter_map(|(key, absent)| absent.then_some(key))
            .collect();
            Err(GenerationError::InvalidSchema { missing })
        }
    }
}

fn outcome_label(error: &GenerationError) -> &'static str {
    match error {
        GenerationError::MissingPrompt => "invalid_request",
        GenerationError::NotConfigured => "not_configured",
        GenerationError::Timeout(_) => "timeout",
        GenerationError::RateLimited { .. } => "rate_limited",
        GenerationError::Upstream { .. } => "upstream_error",
        GenerationError::MalformedResponse { .. } => "malformed_response",
        GenerationError::InvalidSchema { .. } => "invalid_schema",
    }
}
