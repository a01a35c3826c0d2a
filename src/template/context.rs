//! Per-request data available to placeholders.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Request-scoped bundle of path, query, body and header data.
///
/// Built fresh for each request by the dispatcher and dropped once the
/// response is written; never shared between requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    /// Named path segments, already percent-decoded.
    pub path_params: HashMap<String, String>,
    /// Decoded query string. Repeated keys hold arrays.
    pub query_params: Map<String, Value>,
    /// Decoded request body.
    pub body: Value,
    /// Lower-cased header names.
    pub headers: Map<String, Value>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self {
            body: Value::Object(Map::new()),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
