//! Request-level middleware and extractors.
//!
//! # Usage
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/api/generate-class", post(handler))
//!     .layer(Extension(TrustProxyHeaders(false)))
//!     .layer(middleware::from_fn(preflight_middleware));
//!
//! async fn handler(CallerIdentity(caller): CallerIdentity) -> impl IntoResponse {
//!     format!("Hello, {}", caller)
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request},
    http::{request::Parts, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Answer every `OPTIONS` request with an empty 200, whatever the path.
pub async fn preflight_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

/// Request extension telling [`CallerIdentity`] whether forwarding headers
/// come from a trusted reverse proxy. Absent means untrusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrustProxyHeaders(pub bool);

/// Rate-limit key for the caller.
///
/// With [`TrustProxyHeaders`] enabled the order is: first `X-Forwarded-For`
/// entry, `X-Real-IP`, the socket peer address, then `"unknown"`. Otherwise
/// forwarding headers are ignored and only the peer address is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub String);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let trusted = parts
            .extensions
            .get::<TrustProxyHeaders>()
            .copied()
            .unwrap_or_default();

        if trusted.0 {
            if let Some(ip) = forwarded_ip(&parts.headers) {
                return Ok(CallerIdentity(ip));
            }
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(CallerIdentity(peer.unwrap_or_else(|| "unknown".to_string())))
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| header("x-real-ip"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::Request as HttpRequest,
        middleware,
        routing::{get, post},
        Extension, Router,
    };
    use tower::ServiceExt;

    async fn whoami(CallerIdentity(caller): CallerIdentity) -> String {
        caller
    }

    async fn caller_for(request: HttpRequest<Body>) -> String {
        caller_with_trust(request, false).await
    }

    async fn caller_with_trust(request: HttpRequest<Body>, trusted: bool) -> String {
        let app = Router::new()
            .route("/", get(whoami))
            .layer(Extension(TrustProxyHeaders(trusted)));
        let response = app.oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_forwarded_for_takes_first_hop() {
        let request = HttpRequest::builder()
            .uri("/")
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .header("X-Real-IP", "198.51.100.2")
            .body(Body::empty())
            .unwrap();

        assert_eq!(caller_with_trust(request, true).await, "203.0.113.7");
    }

    #[tokio::test]
    async fn test_real_ip_used_without_forwarded_for() {
        let request = HttpRequest::builder()
            .uri("/")
            .header("X-Real-IP", "198.51.100.2")
            .body(Body::empty())
            .unwrap();

        assert_eq!(caller_with_trust(request, true).await, "198.51.100.2");
    }

    #[tokio::test]
    async fn test_forwarding_headers_ignored_when_untrusted() {
        for i in 0..3 {
            let mut request = HttpRequest::builder()
                .uri("/")
                .header("X-Forwarded-For", format!("6.6.6.{}", i))
                .header("X-Real-IP", format!("6.6.7.{}", i))
                .body(Body::empty())
                .unwrap();
            request
                .extensions_mut()
                .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 10], 40000 + i))));

            assert_eq!(caller_for(request).await, "192.0.2.10");
        }

        // No extension at all behaves like an untrusted deployment.
        let request = HttpRequest::builder()
            .uri("/")
            .header("X-Forwarded-For", "6.6.6.6")
            .body(Body::empty())
            .unwrap();
        let app = Router::new().route("/", get(whoami));
        let response = app.oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"unknown");
    }

    #[tokio::test]
    async fn test_peer_address_then_unknown() {
        let mut request = HttpRequest::builder().uri("/").body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 10], 5555))));
        assert_eq!(caller_for(request).await, "192.0.2.10");

        let request = HttpRequest::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(caller_for(request).await, "unknown");
    }

    #[tokio::test]
    async fn test_options_short_circuits_any_path() {
        let app = Router::new()
            .route("/api/generate-class", post(|| async { "posted" }))
            .fallback(|| async { StatusCode::NOT_FOUND })
            .layer(middleware::from_fn(preflight_middleware));

        for uri in ["/api/generate-class", "/nowhere"] {
            let request = HttpRequest::builder()
                .method(Method::OPTIONS)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
