//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    config::Environment,
    ports::{CatalogRepo, ClockPort, RandomPort, RateLimiter, TextGenerationPort},
};
use crate::use_cases::{CatalogOverview, GenerationService, RollClass};

/// Main application state.
///
/// Holds the use cases plus the few ports handlers touch directly.
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub clock: Arc<dyn ClockPort>,
    pub environment: Environment,
    /// Key rate limits on proxy forwarding headers instead of the peer address.
    pub trust_proxy_headers: bool,
}

/// Container for all use cases.
pub struct UseCases {
    pub generation: Arc<GenerationService>,
    pub roll_class: RollClass,
    pub catalog: CatalogOverview,
}

impl App {
    /// Create a new App with system time and randomness.
    pub fn new(
        catalog: Arc<dyn CatalogRepo>,
        llm: Arc<dyn TextGenerationPort>,
        rate_limiter: Arc<dyn RateLimiter>,
        environment: Environment,
    ) -> Self {
        Self::with_ports(
            catalog,
            llm,
            rate_limiter,
            Arc::new(SystemClock::new()),
            Arc::new(SystemRandom::new()),
            environment,
        )
    }

    /// Create an App with every port supplied by the caller.
    pub fn with_ports(
        catalog: Arc<dyn CatalogRepo>,
        llm: Arc<dyn TextGenerationPort>,
        rate_limiter: Arc<dyn RateLimiter>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        environment: Environment,
    ) -> Self {
        let generation = Arc::new(GenerationService::new(llm));

        let use_cases = UseCases {
            roll_class: RollClass::new(
                catalog.clone(),
                generation.clone(),
                random,
                clock.clone(),
            ),
            catalog: CatalogOverview::new(catalog),
            generation,
        };

        Self {
            use_cases,
            rate_limiter,
            clock,
            environment,
            trust_proxy_headers: false,
        }
    }

    pub fn with_trust_proxy_headers(mut self, trusted: bool) -> Self {
        self.trust_proxy_headers = trusted;
        self
    }
}
