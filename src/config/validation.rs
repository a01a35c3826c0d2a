//! Configuration validation.
//!
//! # Responsibilities
//! - Check the decoded (untyped) document before it becomes a typed config
//! - Validate value ranges (ports, status codes, delays)
//! - Report every violation with a field path, not just the first
//!
//! # Design Decisions
//! - Pure function: `&Value -> ValidationResult`, no I/O
//! - Errors follow document order: server, then endpoints by index, then
//!   path/method/response/alternates within an endpoint
//! - Type checks run before range checks; a failed type check suppresses
//!   the range check for the same field
//! - `null` optional fields count as absent

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::config::schema::HttpMethod;

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Dotted/bracketed path, e.g. `endpoints[2].response.statusCode`.
    pub field: String,
    pub message: String,
    /// The offending value, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    fn with_value(mut self, value: Option<&Value>) -> Self {
        self.value = value.cloned();
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Look up a key, falling back to legacy aliases. `null` reads as absent.
fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| obj.get(*name))
        .filter(|v| !v.is_null())
}

/// Non-object values are checked as if they had no fields at all.
fn fields_of(value: &Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// Validate a complete configuration document.
pub fn validate(config: &Value) -> ValidationResult {
    let mut errors = Vec::new();
    let root = fields_of(config);

    match field(&root, &["server"]) {
        None => errors.push(ValidationError::new(
            "server",
            "Server configuration is required",
        )),
        Some(server) => errors.extend(validate_server(server)),
    }

    match field(&root, &["endpoints", "apis"]) {
        None => errors.push(ValidationError::new(
            "endpoints",
            "Endpoints array is required",
        )),
        Some(Value::Array(endpoints)) => errors.extend(validate_endpoints(endpoints)),
        Some(other) => errors.push(
            ValidationError::new("endpoints", "Endpoints must be an array").with_value(Some(other)),
        ),
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Validate the `server` block on its own.
pub fn validate_server(server: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let server = fields_of(server);

    let port = field(&server, &["port"]);
    match port.and_then(Value::as_f64) {
        None => errors.push(
            ValidationError::new("server.port", "Port must be a number").with_value(port),
        ),
        Some(p) if !(1.0..=65535.0).contains(&p) => errors.push(
            ValidationError::new("server.port", "Port must be between 1 and 65535")
                .with_value(port),
        ),
        Some(_) => {}
    }

    let host = field(&server, &["host"]);
    match host.and_then(Value::as_str) {
        None => errors.push(
            ValidationError::new("server.host", "Host must be a string").with_value(host),
        ),
        Some(h) if h.trim().is_empty() => errors.push(
            ValidationError::new("server.host", "Host cannot be empty").with_value(host),
        ),
        Some(_) => {}
    }

    let cors = field(&server, &["corsEnabled", "cors"]);
    if !matches!(cors, Some(Value::Bool(_))) {
        errors.push(
            ValidationError::new("server.corsEnabled", "CORS flag must be a boolean")
                .with_value(cors),
        );
    }

    errors
}

/// Validate every endpoint, addressing errors by array index.
pub fn validate_endpoints(endpoints: &[Value]) -> Vec<ValidationError> {
    endpoints
        .iter()
        .enumerate()
        .flat_map(|(index, endpoint)| validate_endpoint(endpoint, index))
        .collect()
}

fn validate_endpoint(endpoint: &Value, index: usize) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let prefix = format!("endpoints[{}]", index);
    let endpoint = fields_of(endpoint);

    let path = field(&endpoint, &["path"]);
    match path.and_then(Value::as_str) {
        None => errors.push(
            ValidationError::new(format!("{}.path", prefix), "Endpoint path must be a string")
                .with_value(path),
        ),
        Some(p) if p.trim().is_empty() => errors.push(ValidationError::new(
            format!("{}.path", prefix),
            "Endpoint path cannot be empty",
        )),
        Some(_) => {}
    }

    let method = field(&endpoint, &["method"]);
    let known = method
        .and_then(Value::as_str)
        .map(|m| m.parse::<HttpMethod>().is_ok())
        .unwrap_or(false);
    if !known {
        let shown = match method {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "undefined".to_string(),
        };
        errors.push(
            ValidationError::new(
                format!("{}.method", prefix),
                format!("Invalid HTTP method: {}", shown),
            )
            .with_value(method),
        );
    }

    match field(&endpoint, &["response"]) {
        None => errors.push(ValidationError::new(
            format!("{}.response", prefix),
            "Endpoint response is required",
        )),
        Some(response) => {
            errors.extend(validate_response(response, &format!("{}.response", prefix)))
        }
    }

    match field(&endpoint, &["alternateResponses", "responses"]) {
        None => {}
        Some(Value::Array(alternates)) => {
            for (i, alternate) in alternates.iter().enumerate() {
                let alt_prefix = format!("{}.alternateResponses[{}]", prefix, i);
                errors.extend(validate_alternate(alternate, &alt_prefix));
            }
        }
        Some(other) => errors.push(
            ValidationError::new(
                format!("{}.alternateResponses", prefix),
                "Alternate responses must be an array",
            )
            .with_value(Some(other)),
        ),
    }

    errors
}

fn validate_alternate(alternate: &Value, prefix: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let alternate = fields_of(alternate);

    if let Some(probability) = field(&alternate, &["probability"]) {
        match probability.as_f64() {
            None => errors.push(
                ValidationError::new(
                    format!("{}.probability", prefix),
                    "Probability must be a number",
                )
                .with_value(Some(probability)),
            ),
            Some(p) if !(0.0..=1.0).contains(&p) => errors.push(
                ValidationError::new(
                    format!("{}.probability", prefix),
                    "Probability must be between 0 and 1",
                )
                .with_value(Some(probability)),
            ),
            Some(_) => {}
        }
    }

    match field(&alternate, &["response"]) {
        None => errors.push(ValidationError::new(
            format!("{}.response", prefix),
            "Alternate response is required",
        )),
        Some(response) => {
            errors.extend(validate_response(response, &format!("{}.response", prefix)))
        }
    }

    errors
}

/// Validate a response block under the given field prefix.
pub fn validate_response(response: &Value, prefix: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let response = fields_of(response);

    let status = field(&response, &["statusCode", "status"]);
    match status.and_then(Value::as_f64) {
        None => errors.push(
            ValidationError::new(
                format!("{}.statusCode", prefix),
                "Response status code must be a number",
            )
            .with_value(status),
        ),
        Some(s) if !(100.0..=599.0).contains(&s) => errors.push(
            ValidationError::new(
                format!("{}.statusCode", prefix),
                "HTTP status code must be between 100 and 599",
            )
            .with_value(status),
        ),
        Some(_) => {}
    }

    if let Some(headers) = field(&response, &["headers"]) {
        if !headers.is_object() {
            errors.push(
                ValidationError::new(
                    format!("{}.headers", prefix),
                    "Response headers must be an object",
                )
                .with_value(Some(headers)),
            );
        }
    }

    if let Some(delay) = field(&response, &["delayMs", "delay"]) {
        match delay.as_f64() {
            None => errors.push(
                ValidationError::new(
                    format!("{}.delayMs", prefix),
                    "Response delay must be a number",
                )
                .with_value(Some(delay)),
            ),
            Some(d) if d < 0.0 => errors.push(
                ValidationError::new(
                    format!("{}.delayMs", prefix),
                    "Response delay cannot be negative",
                )
                .with_value(Some(delay)),
            ),
            Some(_) => {}
        }
    }

    errors
}
