//! Engine configuration from environment variables.
//!
//! Parsing goes through a lookup function, so tests can feed a map instead
//! of mutating the process environment. Unparseable values fall back to
//! their defaults with a warning.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::infrastructure::gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::infrastructure::rate_limiter::RateLimitConfig;

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_CATALOG_DB: &str = "catalog.db";

/// Deployment mode. Development exposes diagnostic fields in error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Gemini connection settings. `Debug` never prints the key.
#[derive(Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub server_host: String,
    pub server_port: u16,
    pub gemini: GeminiSettings,
    pub catalog_db: String,
    /// Directory holding `themes.json`, `roles.json`, `metadata.json`
    pub catalog_seed_dir: Option<PathBuf>,
    pub environment: Environment,
    pub rate_limit: RateLimitConfig,
    /// `*` or a comma-separated origin list
    pub cors_allowed_origins: String,
    /// Key callers on `X-Forwarded-For` / `X-Real-IP` instead of the socket peer.
    /// Only safe behind a reverse proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
}

impl EngineConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let server_port = get("SERVER_PORT")
            .or_else(|| get("PORT"))
            .map(|raw| parse_or("SERVER_PORT", &raw, DEFAULT_SERVER_PORT))
            .unwrap_or(DEFAULT_SERVER_PORT);

        let defaults = RateLimitConfig::default();
        let max_requests = get("RATE_LIMIT_MAX_REQUESTS")
            .map(|raw| parse_or("RATE_LIMIT_MAX_REQUESTS", &raw, defaults.max_requests))
            .filter(|max| *max > 0)
            .unwrap_or(defaults.max_requests);
        let window = get("RATE_LIMIT_WINDOW_SECS")
            .map(|raw| parse_or("RATE_LIMIT_WINDOW_SECS", &raw, defaults.window.as_secs()))
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.window);

        Self {
            server_host: get("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.into()),
            server_port,
            gemini: GeminiSettings {
                api_key: get("GEMINI_API_KEY"),
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
                base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            },
            catalog_db: get("CATALOG_DB").unwrap_or_else(|| DEFAULT_CATALOG_DB.into()),
            catalog_seed_dir: get("CATALOG_SEED_DIR").map(PathBuf::from),
            environment: get("LOREFORGE_ENV")
                .map(|raw| Environment::parse(&raw))
                .unwrap_or(Environment::Production),
            rate_limit: RateLimitConfig {
                max_requests,
                window,
            },
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| "*".into()),
            trust_proxy_headers: get("TRUST_PROXY_HEADERS")
                .map(|raw| parse_flag("TRUST_PROXY_HEADERS", &raw))
                .unwrap_or(false),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: std::str::FromStr + fmt::Display + Copy,
{
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = raw, default = %default, "Ignoring unparseable setting");
        default
    })
}

fn parse_flag(key: &str, raw: &str) -> bool {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            tracing::warn!(key, value = raw, "Ignoring unparseable flag, using false");
            false
        }
    }
}
