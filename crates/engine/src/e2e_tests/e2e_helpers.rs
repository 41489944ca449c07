//! Helpers for wiring the application stack in route tests.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use tower::ServiceExt;

use loreforge_domain::{CatalogEntry, RarityWeights};

use crate::api::build_router;
use crate::app::App;
use crate::infrastructure::catalog::SqliteCatalogRepo;
use crate::infrastructure::clock::{FixedClock, FixedRandom};
use crate::infrastructure::config::Environment;
use crate::infrastructure::ports::{CatalogRepo, LlmError, TextGenerationPort, TextGenerationRequest};
use crate::infrastructure::rate_limiter::{FixedWindowRateLimiter, RateLimitConfig};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

// =============================================================================
// Scripted model
// =============================================================================

/// Text-generation port that always answers with the same result.
pub struct ScriptedLlm {
    configured: bool,
    reply: Result<String, LlmError>,
    calls: AtomicUsize,
    last_prompt: std::sync::Mutex<Option<String>>,
}

impl ScriptedLlm {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            configured: true,
            reply: Ok(text.into()),
            calls: AtomicUsize::new(0),
            last_prompt: std::sync::Mutex::new(None),
        }
    }

    pub fn failing(error: LlmError) -> Self {
        Self {
            reply: Err(error),
            ..Self::replying("")
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::failing(LlmError::NotConfigured)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerationPort for ScriptedLlm {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(&self, request: TextGenerationRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(request.prompt);
        self.reply.clone()
    }
}

// =============================================================================
// Test application
// =============================================================================

pub struct TestApp {
    pub router: Router,
    pub llm: Arc<ScriptedLlm>,
}

pub struct TestAppBuilder {
    llm: ScriptedLlm,
    environment: Environment,
    roll_fraction: f64,
    seed: bool,
    trust_proxy_headers: bool,
}

impl TestAppBuilder {
    pub fn new(llm: ScriptedLlm) -> Self {
        Self {
            llm,
            environment: Environment::Production,
            roll_fraction: 0.0,
            seed: true,
            trust_proxy_headers: false,
        }
    }

    /// Deploy as if behind a reverse proxy that sets `X-Forwarded-For`.
    pub fn behind_proxy(mut self) -> Self {
        self.trust_proxy_headers = true;
        self
    }

    pub fn development(mut self) -> Self {
        self.environment = Environment::Development;
        self
    }

    /// Fraction of the weight total the rarity roll lands on.
    pub fn roll_at(mut self, fraction: f64) -> Self {
        self.roll_fraction = fraction;
        self
    }

    pub fn empty_catalog(mut self) -> Self {
        self.seed = false;
        self
    }

    pub async fn build(self) -> TestApp {
        let clock = Arc::new(FixedClock(fixed_now()));
        let catalog = Arc::new(SqliteCatalogRepo::in_memory(clock.clone()).await.unwrap());
        if self.seed {
            seed_catalog(catalog.as_ref()).await;
        }

        let llm = Arc::new(self.llm);
        let rate_limiter = Arc::new(FixedWindowRateLimiter::new(
            RateLimitConfig::default(),
            clock.clone(),
        ));

        let app = Arc::new(App::with_ports(
            catalog,
            llm.clone(),
            rate_limiter,
            clock,
            Arc::new(FixedRandom {
                fraction: self.roll_fraction,
                index: 0,
            }),
            self.environment,
        )
        .with_trust_proxy_headers(self.trust_proxy_headers));

        TestApp {
            router: build_router(app),
            llm,
        }
    }
}

/// Two themes and two roles, split across Common and Legendary.
async fn seed_catalog(catalog: &dyn CatalogRepo) {
    catalog
        .save_theme(&CatalogEntry::new("ember", "Ember", "Common", "Smouldering coals."))
        .await
        .unwrap();
    catalog
        .save_theme(&CatalogEntry::new("void", "Void", "Legendary", "The space between stars."))
        .await
        .unwrap();
    catalog
        .save_role(&CatalogEntry::new("warden", "Warden", "Common", "A steadfast guard."))
        .await
        .unwrap();
    catalog
        .save_role(&CatalogEntry::new("oracle", "Oracle", "Rare", "Sees what comes."))
        .await
        .unwrap();
    catalog
        .save_rarity_weights(&RarityWeights::new([("Common", 3.0), ("Legendary", 1.0)]).unwrap())
        .await
        .unwrap();
}

// =============================================================================
// Requests
// =============================================================================

/// JSON POST arriving from the socket peer `peer`.
pub fn post_json(uri: &str, peer: &str, body: serde_json::Value) -> Request<Body> {
    let peer: IpAddr = peer.parse().unwrap();
    let mut request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::new(peer, 40_000)));
    request
}

pub fn forwarded_for(mut request: Request<Body>, client: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert("x-forwarded-for", client.parse().unwrap());
    request
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
