//! HTTP routes.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;

use loreforge_domain::DomainError;
use loreforge_shared::{
    CatalogSummaryResponse, EndpointIndex, ErrorResponse, ErrorType, GenerateClassRequest,
    GenerateClassResponse, GenerateStoryRequest, GenerateStoryResponse, HealthResponse,
    RollClassRequest, RollClassResponse, ServiceInfoResponse,
};

use super::middleware::{preflight_middleware, CallerIdentity, TrustProxyHeaders};
use crate::app::App;
use crate::infrastructure::config::Environment;
use crate::infrastructure::correlation::RequestId;
use crate::infrastructure::ports::{RateDecision, RepoError};
use crate::use_cases::{GenerationError, RollClassError};

/// Request bodies above this size are rejected.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub const SERVICE_NAME: &str = "LoreForge RPG Backend";

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(service_info))
        .route("/api/health", get(health))
        .route("/api/generate-class", post(generate_class))
        .route("/api/generate-story", post(generate_story))
        .route("/api/roll-class", post(roll_class))
        .route("/api/catalog", get(catalog_summary))
}

/// Routes plus body limit and `OPTIONS` handling, bound to `app`.
pub fn build_router(app: Arc<App>) -> Router {
    routes()
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(Extension(TrustProxyHeaders(app.trust_proxy_headers)))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(preflight_middleware))
        .with_state(app)
}

// =============================================================================
// Service info
// =============================================================================

async fn service_info(State(app): State<Arc<App>>) -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse {
        message: SERVICE_NAME.to_string(),
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: EndpointIndex {
            health: "/api/health".to_string(),
            generate_class: "/api/generate-class".to_string(),
            generate_story: "/api/generate-story".to_string(),
            roll_class: "/api/roll-class".to_string(),
            catalog: "/api/catalog".to_string(),
        },
        timestamp: app.clock.now(),
    })
}

async fn health(State(app): State<Arc<App>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: app.clock.now(),
        gemini_configured: app.use_cases.generation.is_configured(),
    })
}

// =============================================================================
// Generation
// =============================================================================

async fn generate_class(
    State(app): State<Arc<App>>,
    caller: CallerIdentity,
    payload: Result<Json<GenerateClassRequest>, JsonRejection>,
) -> Result<Json<GenerateClassResponse>, ApiError> {
    enforce_rate_limit(&app, &caller)?;
    let Json(request) = payload.map_err(ApiError::from_json_rejection)?;
    let request_id = RequestId::from_client(request.request_id());

    tracing::info!(
        request_id = %request_id.short(),
        caller = %caller.0,
        rarity = request.rarity.as_deref().unwrap_or("random"),
        "Generating class"
    );

    let class = app
        .use_cases
        .generation
        .generate_class(request.prompt(), &request_id)
        .await
        .map_err(|e| {
            ApiError::from_generation(e, "class", app.environment).with_request_id(&request_id)
        })?;

    Ok(Json(GenerateClassResponse::new(
        class,
        request_id,
        app.clock.now(),
    )))
}

async fn generate_story(
    State(app): State<Arc<App>>,
    caller: CallerIdentity,
    payload: Result<Json<GenerateStoryRequest>, JsonRejection>,
) -> Result<Json<GenerateStoryResponse>, ApiError> {
    enforce_rate_limit(&app, &caller)?;
    let Json(request) = payload.map_err(ApiError::from_json_rejection)?;
    let request_id = RequestId::from_client(request.request_id());

    tracing::info!(request_id = %request_id.short(), caller = %caller.0, "Generating story");

    let story = app
        .use_cases
        .generation
        .generate_story(request.prompt(), &request_id)
        .await
        .map_err(|e| {
            ApiError::from_generation(e, "story", app.environment).with_request_id(&request_id)
        })?;

    Ok(Json(GenerateStoryResponse::new(
        story,
        request_id,
        app.clock.now(),
    )))
}

// =============================================================================
// Rolls and catalog
// =============================================================================

async fn roll_class(
    State(app): State<Arc<App>>,
    caller: CallerIdentity,
    body: Bytes,
) -> Result<Json<RollClassResponse>, ApiError> {
    // An empty body is a plain roll.
    let request: RollClassRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RollClassRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::invalid_request(format!("Invalid JSON body: {}", e)))?
    };

    // Only augmented rolls reach the upstream API.
    if request.augment {
        enforce_rate_limit(&app, &caller)?;
    }

    let request_id = RequestId::from_client(request.request_id());
    let class = app
        .use_cases
        .roll_class
        .execute(request.augment, &request_id)
        .await
        .map_err(|e| ApiError::from_roll(e, app.environment).with_request_id(&request_id))?;

    Ok(Json(RollClassResponse::new(
        class,
        request_id,
        app.clock.now(),
    )))
}

async fn catalog_summary(
    State(app): State<Arc<App>>,
) -> Result<Json<CatalogSummaryResponse>, ApiError> {
    let snapshot = app
        .use_cases
        .catalog
        .execute()
        .await
        .map_err(|e| ApiError::from_storage(e, app.environment))?;

    Ok(Json(CatalogSummaryResponse {
        themes: snapshot.counts.themes,
        roles: snapshot.counts.roles,
        combinations: snapshot.counts.combinations(),
        rarity_weights: snapshot.rarity_weights,
    }))
}

fn enforce_rate_limit(app: &App, caller: &CallerIdentity) -> Result<(), ApiError> {
    match app.rate_limiter.check_and_increment(&caller.0) {
        RateDecision::Allowed { .. } => Ok(()),
        RateDecision::Rejected { retry_after_secs } => {
            tracing::warn!(caller = %caller.0, retry_after_secs, "Rate limit exceeded");
            Err(ApiError::rate_limited(
                "Rate limit exceeded. Please try again later.",
                retry_after_secs,
            ))
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Failure envelope plus its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(error_type, message),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorType::InvalidRequestError, message)
    }

    pub fn rate_limited(message: impl Into<String>, retry_after_secs: u64) -> Self {
        let mut error = Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            ErrorType::RateLimitedError,
            message,
        );
        error.body = error.body.with_retry_after(retry_after_secs);
        error
    }

    fn from_json_rejection(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorType::InvalidRequestError,
                "Request body too large",
            );
        }
        Self::invalid_request(format!("Invalid JSON body: {}", rejection.body_text()))
    }

    /// `what` names the artifact in messages ("class" or "story").
    pub fn from_generation(error: GenerationError, what: &str, environment: Environment) -> Self {
        let details = error.to_string();
        let api_error = match error {
            GenerationError::MissingPrompt => return Self::invalid_request("Prompt is required"),
            GenerationError::NotConfigured => {
                return Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorType::ConfigurationError,
                    "Gemini API key not configured",
                )
            }
            GenerationError::RateLimited { retry_after_secs } => {
                return Self::rate_limited("Gemini API rate limit exceeded", retry_after_secs)
            }
            GenerationError::Timeout(_) => Self::new(
                StatusCode::REQUEST_TIMEOUT,
                ErrorType::TimeoutError,
                "Request timeout - Gemini API took too long to respond",
            ),
            GenerationError::Upstream {
                status: Some(400), ..
            } => Self::new(
                StatusCode::BAD_REQUEST,
                ErrorType::UpstreamError,
                "Invalid request to Gemini API",
            ),
            GenerationError::Upstream { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorType::UpstreamError,
                format!("Failed to generate {}", what),
            ),
            GenerationError::MalformedResponse {
                raw,
                parser_message,
            } => {
                let mut api_error = Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorType::MalformedResponseError,
                    format!("Failed to parse {} as JSON", what),
                );
                if environment.is_development() {
                    api_error.body = api_error
                        .body
                        .with_raw_response(raw)
                        .with_details(parser_message);
                }
                return api_error;
            }
            GenerationError::InvalidSchema { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorType::InvalidSchemaError,
                format!("Invalid {} data structure from API", what),
            ),
        };
        api_error.with_details_in(environment, details)
    }

    pub fn from_roll(error: RollClassError, environment: Environment) -> Self {
        match error {
            RollClassError::Generation(e) => Self::from_generation(e, "class", environment),
            RollClassError::Storage(e) => Self::from_storage(e, environment),
            RollClassError::Domain(e) => {
                let details = e.to_string();
                let api_error = match e {
                    DomainError::NoCandidates { .. } => Self::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorType::NoCandidatesError,
                        "No themes or roles available",
                    ),
                    DomainError::Configuration(_) => Self::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorType::ConfigurationError,
                        "Rarity configuration is invalid",
                    ),
                };
                api_error.with_details_in(environment, details)
            }
        }
    }

    pub fn from_storage(error: RepoError, environment: Environment) -> Self {
        tracing::error!(error = %error, "Catalog storage failure");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorType::StorageError,
            "Catalog unavailable",
        )
        .with_details_in(environment, error.to_string())
    }

    pub fn with_request_id(mut self, request_id: &RequestId) -> Self {
        self.body = self.body.with_request_id(request_id.as_str());
        self
    }

    fn with_details_in(mut self, environment: Environment, details: String) -> Self {
        if environment.is_development() {
            self.body = self.body.with_details(details);
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}
