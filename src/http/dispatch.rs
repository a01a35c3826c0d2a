//! Request dispatch.
//!
//! # Responsibilities
//! - Serve each request against one configuration snapshot
//! - Match the route, capture the request, render the endpoint's response
//! - Turn misses into 404 and handler failures into 500 payloads
//!
//! # Design Decisions
//! - The snapshot is loaded once by the CORS layer and handed down in the
//!   request extensions, so a reload mid-request cannot change the route
//!   or CORS settings the request is served with
//! - Only the body is templated; configured headers are copied verbatim
//! - The configured delay is an async sleep and never blocks other requests

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use http_body_util::LengthLimitError;
use serde_json::Value;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::schema::{EndpointSpec, HttpMethod};
use crate::http::server::{AppState, InnerState};
use crate::http::{request, response};
use crate::observability::{metrics, ServerEvent};
use crate::template::{TemplateContext, TemplateResolver};

/// Failure while producing a matched endpoint's response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid header name '{0}'")]
    HeaderName(String),

    #[error("Invalid value for header '{0}'")]
    HeaderValue(String),

    #[error("Unsupported status code {0}")]
    Status(u16),

    #[error("Status code {0} is informational and cannot end a response")]
    Informational(u16),

    #[error("Failed to serialize response body: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Fallback handler: every request enters here.
pub async fn handle_request(State(state): State<AppState>, req: Request) -> Response {
    let start = Instant::now();
    let inner = req
        .extensions()
        .get::<Arc<InnerState>>()
        .cloned()
        .unwrap_or_else(|| state.inner.load_full());

    route_request(&state, &inner, req, start).await
}

async fn route_request(
    state: &AppState,
    inner: &InnerState,
    req: Request,
    start: Instant,
) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let original_uri = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    let found = HttpMethod::from_http(req.method())
        .and_then(|m| inner.routes.match_route(m, &path));
    let Some(found) = found else {
        state.events.emit(ServerEvent::RouteNotFound {
            method: method.clone(),
            path: path.clone(),
        });
        metrics::record_request(&method, 404, "none", start);
        return response::not_found(&method, &original_uri, &path);
    };

    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) if exceeds_limit(&e) => {
            metrics::record_request(&method, 413, &found.endpoint.path, start);
            return response::payload_too_large();
        }
        Err(e) => {
            tracing::warn!(method = %method, path = %path, error = %e, "Failed to read request body");
            metrics::record_request(&method, 400, &found.endpoint.path, start);
            return response::bad_request(&format!("Failed to read request body: {}", e));
        }
    };

    let context = match request::capture(&parts, found.params, &bytes) {
        Ok(context) => context,
        Err(e) => {
            metrics::record_request(&method, 400, &found.endpoint.path, start);
            return response::bad_request(&e.to_string());
        }
    };

    let (status, response) = match dispatch(&found.endpoint, &context, &state.resolver).await {
        Ok(response) => (response.status().as_u16(), response),
        Err(e) => {
            state.events.emit(ServerEvent::HandlerFailed {
                method: method.clone(),
                path: path.clone(),
                message: e.to_string(),
            });
            (500, response::internal_error(&e.to_string()))
        }
    };

    metrics::record_request(&method, status, &found.endpoint.path, start);
    state.events.emit(ServerEvent::RequestServed {
        method,
        path,
        status,
        elapsed: start.elapsed(),
    });
    response
}

/// Produce the configured response for a matched endpoint.
pub async fn dispatch(
    endpoint: &EndpointSpec,
    context: &TemplateContext,
    resolver: &TemplateResolver,
) -> Result<Response, DispatchError> {
    let spec = &endpoint.response;
    let status =
        StatusCode::from_u16(spec.status_code).map_err(|_| DispatchError::Status(spec.status_code))?;
    if status.is_informational() {
        return Err(DispatchError::Informational(spec.status_code));
    }

    let mut headers = HeaderMap::new();
    for (name, value) in spec.headers.iter().flatten() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| DispatchError::HeaderName(name.clone()))?;
        let header_value = HeaderValue::from_str(&header_text(value))
            .map_err(|_| DispatchError::HeaderValue(name.clone()))?;
        headers.insert(header_name, header_value);
    }

    let rendered = spec.body.as_ref().map(|body| resolver.resolve(body, context));

    if let Some(ms) = spec.delay_ms.filter(|ms| *ms > 0) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    let body = match rendered {
        Some(value) => {
            let bytes = serde_json::to_vec(&value)?;
            if !headers.contains_key(header::CONTENT_TYPE) {
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
            }
            Body::from(bytes)
        }
        None => Body::empty(),
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().extend(headers);
    Ok(response)
}

/// A streamed body without a declared length only hits the size limit
/// while it is being read.
fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

fn header_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ResponseSpec;
    use serde_json::{json, Map};

    fn endpoint(response: ResponseSpec) -> EndpointSpec {
        EndpointSpec {
            path: "/api/users/:id".into(),
            method: HttpMethod::Get,
            response,
            alternate_responses: None,
        }
    }

    fn response_spec(status: u16) -> ResponseSpec {
        ResponseSpec {
            status_code: status,
            headers: None,
            body: None,
            delay_ms: None,
        }
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_templated_body() {
        let mut spec = response_spec(200);
        spec.body = Some(json!({ "id": "{{params.id}}", "name": "User {{params.id}}" }));
        let ctx = TemplateContext::new().with_param("id", "123");

        let response = dispatch(&endpoint(spec), &ctx, &TemplateResolver::new())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body, json!({ "id": "123", "name": "User 123" }));
    }

    #[tokio::test]
    async fn test_headers_copied_verbatim() {
        let mut spec = response_spec(201);
        let mut headers = Map::new();
        headers.insert("X-Custom".into(), json!("{{params.id}}"));
        headers.insert("Content-Type".into(), json!("application/vnd.api+json"));
        headers.insert("X-Version".into(), json!(2));
        spec.headers = Some(headers);
        spec.body = Some(json!("created"));

        let response = dispatch(&endpoint(spec), &TemplateContext::new(), &TemplateResolver::new())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-custom"], "{{params.id}}");
        assert_eq!(response.headers()["x-version"], "2");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/vnd.api+json");
        assert_eq!(body_bytes(response).await, br#""created""#.to_vec());
    }

    #[tokio::test]
    async fn test_no_body_is_empty() {
        let response = dispatch(
            &endpoint(response_spec(204)),
            &TemplateContext::new(),
            &TemplateResolver::new(),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_header_is_dispatch_error() {
        let mut spec = response_spec(200);
        let mut headers = Map::new();
        headers.insert("Bad Header".into(), json!("x"));
        spec.headers = Some(headers);

        let err = dispatch(&endpoint(spec), &TemplateContext::new(), &TemplateResolver::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid header name 'Bad Header'");
    }

    #[tokio::test]
    async fn test_informational_status_is_dispatch_error() {
        let err = dispatch(
            &endpoint(response_spec(101)),
            &TemplateContext::new(),
            &TemplateResolver::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DispatchError::Informational(101)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_applied() {
        let mut spec = response_spec(200);
        spec.delay_ms = Some(250);

        let started = tokio::time::Instant::now();
        dispatch(&endpoint(spec), &TemplateContext::new(), &TemplateResolver::new())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(250));
    }
}
