//! Request capture.
//!
//! # Responsibilities
//! - Decode the query string (repeated keys become arrays)
//! - Decode JSON and urlencoded bodies
//! - Flatten headers into a lower-cased name → string map
//! - Assemble the per-request TemplateContext
//!
//! # Design Decisions
//! - Bodies of any other content type read as an empty object
//! - Malformed JSON is a client error, reported before the route runs

use axum::http::{header, request::Parts, HeaderMap};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;
use url::form_urlencoded;

use crate::template::TemplateContext;

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("Invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build the template context for one request.
pub fn capture(
    parts: &Parts,
    path_params: HashMap<String, String>,
    body: &[u8],
) -> Result<TemplateContext, BodyError> {
    Ok(TemplateContext {
        path_params,
        query_params: parse_query(parts.uri.query()),
        body: decode_body(&parts.headers, body)?,
        headers: collect_headers(&parts.headers),
    })
}

/// Decode `a=1&b=2&a=3` into `{ "a": ["1", "3"], "b": "2" }`.
pub fn parse_query(query: Option<&str>) -> Map<String, Value> {
    query
        .map(|q| parse_pairs(q.as_bytes()))
        .unwrap_or_default()
}

fn parse_pairs(input: &[u8]) -> Map<String, Value> {
    let mut params = Map::new();
    for (key, value) in form_urlencoded::parse(input) {
        let value = Value::String(value.into_owned());
        match params.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                params.insert(key.into_owned(), value);
            }
        }
    }
    params
}

/// Repeated headers are joined with `", "`.
pub fn collect_headers(headers: &HeaderMap) -> Map<String, Value> {
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_string(), Value::String(joined))
        })
        .collect()
}

/// Decode the body according to its content type.
pub fn decode_body(headers: &HeaderMap, body: &[u8]) -> Result<Value, BodyError> {
    if body.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let media_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if media_type == "application/json" || media_type.ends_with("+json") {
        Ok(serde_json::from_slice(body)?)
    } else if media_type == "application/x-www-form-urlencoded" {
        Ok(Value::Object(parse_pairs(body)))
    } else {
        Ok(Value::Object(Map::new()))
    }
}
