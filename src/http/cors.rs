//! Permissive CORS handling.
//!
//! When enabled, every response carries the allow headers and `OPTIONS`
//! requests are answered directly with an empty 200. The layer sits
//! outside the body limit and panic guard so their responses are covered.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET,PUT,POST,DELETE,PATCH,OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, Content-Length, X-Requested-With";

/// Add the CORS headers. Headers an endpoint configured itself are kept.
pub fn apply(headers: &mut HeaderMap) {
    for (name, value) in [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN),
        (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
    ] {
        headers
            .entry(name)
            .or_insert(HeaderValue::from_static(value));
    }
}

/// Bare preflight answer.
pub fn preflight() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    apply(response.headers_mut());
    response
}

/// Outer middleware: loads the configuration snapshot for the request,
/// answers preflights and decorates whatever response comes back.
pub async fn handle_cors(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let inner = state.inner.load_full();
    let enabled = inner.config.server.cors_enabled;

    if enabled && req.method() == Method::OPTIONS {
        return preflight();
    }

    req.extensions_mut().insert(inner);
    let mut response = next.run(req).await;
    if enabled {
        apply(response.headers_mut());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("https://example.com"),
        );
        apply(&mut headers);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://example.com");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
    }

    #[test]
    fn test_preflight() {
        let response = preflight();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
