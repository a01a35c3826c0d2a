//! Shared helpers for the integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU16, Ordering};

// Each test binary gets its own range; tests inside one binary run in parallel.
static NEXT_PORT: AtomicU16 = AtomicU16::new(0);

/// A port unique within this test binary, offset by `base`.
pub fn unique_port(base: u16) -> u16 {
    base + NEXT_PORT.fetch_add(1, Ordering::SeqCst)
}

/// Configuration document with the given endpoints on 127.0.0.1.
pub fn config(port: u16, cors: bool, endpoints: Value) -> Value {
    json!({
        "server": { "port": port, "host": "127.0.0.1", "corsEnabled": cors },
        "endpoints": endpoints,
    })
}

/// The reference configuration used across the dispatch tests.
pub fn sample_config(port: u16) -> Value {
    config(
        port,
        true,
        json!([
            {
                "path": "/api/users",
                "method": "GET",
                "response": {
                    "statusCode": 200,
                    "body": { "users": [{ "id": 1, "name": "John Doe" }] }
                }
            },
            {
                "path": "/api/users/:id",
                "method": "GET",
                "response": {
                    "statusCode": 200,
                    "body": { "id": "{{params.id}}", "name": "User {{params.id}}" }
                }
            },
            {
                "path": "/api/users",
                "method": "POST",
                "response": {
                    "statusCode": 201,
                    "headers": { "Location": "/api/users/new" },
                    "body": { "created": true, "data": "{{body}}" }
                }
            },
            {
                "path": "/api/search",
                "method": "GET",
                "response": {
                    "statusCode": 200,
                    "body": { "query": "{{query.q}}", "page": "{{query.page}}" }
                }
            }
        ]),
    )
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Collect a response body and decode it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
