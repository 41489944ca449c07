//! LoreForge Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loreforge_engine::api::build_router;
use loreforge_engine::infrastructure::{
    catalog::{seed_from_dir, SqliteCatalogRepo},
    clock::SystemClock,
    config::EngineConfig,
    gemini::GeminiClient,
    ports::ClockPort,
    rate_limiter::FixedWindowRateLimiter,
};
use loreforge_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may be run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loreforge_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LoreForge Engine");

    let config = EngineConfig::from_env();
    tracing::info!(environment = %config.environment, "Configuration loaded");

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

    // Catalog storage
    tracing::info!("Opening catalog at {}", config.catalog_db);
    let catalog = Arc::new(SqliteCatalogRepo::new(&config.catalog_db, clock.clone()).await?);

    if let Some(seed_dir) = &config.catalog_seed_dir {
        match seed_from_dir(catalog.as_ref(), seed_dir).await {
            Ok(summary) => tracing::info!(
                themes = summary.themes,
                roles = summary.roles,
                rarity_tiers = summary.rarity_tiers,
                dir = %seed_dir.display(),
                "Catalog seeded"
            ),
            Err(e) => {
                tracing::error!(error = %e, dir = %seed_dir.display(), "Catalog seeding failed");
                return Err(e.into());
            }
        }
    }

    // Generative API client
    let gemini = Arc::new(GeminiClient::new(
        &config.gemini.base_url,
        &config.gemini.model,
        config.gemini.api_key.clone(),
    ));
    if config.gemini.api_key.is_some() {
        tracing::info!(model = %gemini.model(), "Gemini client configured");
    } else {
        tracing::warn!("GEMINI_API_KEY not set; generation endpoints will report a configuration error");
    }

    // Per-caller admission control
    let rate_limiter = Arc::new(FixedWindowRateLimiter::new(config.rate_limit, clock.clone()));
    tracing::info!(
        "Rate limiting: max_requests={}, window_secs={}",
        config.rate_limit.max_requests,
        config.rate_limit.window.as_secs()
    );

    // Sweep stale windows so the caller table stays bounded
    let sweeper = rate_limiter.clone();
    let sweep_every = config.rate_limit.window;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            let removed = sweeper.prune_expired();
            if removed > 0 {
                tracing::debug!(removed, "Pruned expired rate limit windows");
            }
        }
    });

    // Create application
    if config.trust_proxy_headers {
        tracing::info!("Rate limiting keyed on proxy forwarding headers");
    }
    let app = Arc::new(
        App::new(catalog, gemini, rate_limiter, config.environment)
            .with_trust_proxy_headers(config.trust_proxy_headers),
    );

    // Build router
    let mut router = build_router(app).layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer(&config.cors_allowed_origins) {
        router = router.layer(cors);
    }

    let addr: SocketAddr = config.bind_address().parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer(allowed_origins: &str) -> Option<CorsLayer> {
    let allowed_origins = allowed_origins.trim();
    if allowed_origins.is_empty() {
        return None;
    }

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(Duration::from_secs(600));

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
