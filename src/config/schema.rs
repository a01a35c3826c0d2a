//! Configuration schema definitions.
//!
//! This module defines the typed shape of a mock server configuration.
//! Values only reach these types after `validation.rs` has accepted the
//! untyped document, so the types carry no validation logic of their own.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Root configuration for the mock server.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Listener settings.
    pub server: ServerSettings,

    /// Endpoint definitions, in registration order.
    #[serde(alias = "apis")]
    pub endpoints: Vec<EndpointSpec>,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    pub port: u16,

    pub host: String,

    /// Attach permissive CORS headers and answer preflight requests.
    #[serde(alias = "cors")]
    pub cors_enabled: bool,
}

impl ServerSettings {
    /// `host:port` form suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A configured (method, path) pair and the response it produces.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    /// Path pattern, e.g. `/api/users/:id`.
    pub path: String,

    pub method: HttpMethod,

    pub response: ResponseSpec,

    /// Weighted or conditional alternatives. Validated, never selected.
    #[serde(
        default,
        alias = "responses",
        skip_serializing_if = "Option::is_none"
    )]
    pub alternate_responses: Option<Vec<ConditionalResponseSpec>>,
}

/// What an endpoint sends back.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSpec {
    #[serde(alias = "status")]
    pub status_code: u16,

    /// Header values are copied verbatim; non-string values use their JSON text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,

    /// Template-bearing payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Artificial latency before the response is written.
    #[serde(
        default,
        alias = "delay",
        deserialize_with = "deserialize_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub delay_ms: Option<u64>,
}

/// Alternative response guarded by a condition or a probability.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalResponseSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,

    pub response: ResponseSpec,
}

/// The fixed set of verbs an endpoint may be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Map a transport method onto the configured set.
    pub fn from_http(method: &axum::http::Method) -> Option<Self> {
        method.as_str().parse().ok()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ();

    /// Exact, case-sensitive match on the upper-case verb.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or(())
    }
}

/// Accept any non-negative JSON number as a millisecond count.
fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(ms) if ms.is_finite() && ms >= 0.0 => Ok(Some(ms.round() as u64)),
        Some(ms) => Err(serde::de::Error::custom(format!(
            "delay must be a non-negative number, got {}",
            ms
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_canonical_names() {
        let config: Configuration = serde_json::from_value(json!({
            "server": { "port": 3000, "host": "localhost", "corsEnabled": true },
            "endpoints": [{
                "path": "/api/users/:id",
                "method": "GET",
                "response": { "statusCode": 200, "body": { "id": "{{params.id}}" }, "delayMs": 25 }
            }]
        }))
        .unwrap();

        assert_eq!(config.server.bind_address(), "localhost:3000");
        assert!(config.server.cors_enabled);
        assert_eq!(config.endpoints[0].method, HttpMethod::Get);
        assert_eq!(config.endpoints[0].response.delay_ms, Some(25));
        assert!(config.endpoints[0].alternate_responses.is_none());
    }

    #[test]
    fn test_decode_legacy_aliases() {
        let config: Configuration = serde_json::from_value(json!({
            "server": { "port": 3000, "host": "localhost", "cors": false },
            "apis": [{
                "path": "/ping",
                "method": "POST",
                "response": { "status": 201, "delay": 10.4 },
                "responses": [{ "probability": 0.5, "response": { "status": 503 } }]
            }]
        }))
        .unwrap();

        let endpoint = &config.endpoints[0];
        assert_eq!(endpoint.response.status_code, 201);
        assert_eq!(endpoint.response.delay_ms, Some(10));
        let alternates = endpoint.alternate_responses.as_ref().unwrap();
        assert_eq!(alternates[0].response.status_code, 503);
    }

    #[test]
    fn test_method_parsing_is_case_sensitive() {
        assert_eq!("DELETE".parse::<HttpMethod>(), Ok(HttpMethod::Delete));
        assert!("delete".parse::<HttpMethod>().is_err());
        assert!("TRACE".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_serialize_uses_canonical_names() {
        let settings = ServerSettings {
            port: 8080,
            host: "0.0.0.0".into(),
            cors_enabled: true,
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value, json!({ "port": 8080, "host": "0.0.0.0", "corsEnabled": true }));
    }
}
