//! Configuration loading.
//!
//! `load_from_object` is the only way a configuration becomes live: the
//! file loader, server construction and runtime reloads all go through it.

use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::Configuration;
use crate::config::validation::{validate, ValidationError};

const SUPPORTED_EXTENSIONS: [&str; 4] = ["yaml", "yml", "json", "toml"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Unsupported file format: {extension}. Supported formats: {supported}")]
    UnsupportedFormat { extension: String, supported: String },

    #[error("Failed to read file: {path}. {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid {format} format: {message}")]
    Parse { format: &'static str, message: String },

    #[error("Configuration must be an object")]
    NotAnObject,

    #[error("Configuration validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Configuration could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate a decoded configuration document and turn it into a typed one.
pub fn load_from_object(value: Value) -> Result<Configuration, ConfigError> {
    if !value.is_object() {
        return Err(ConfigError::NotAnObject);
    }

    let result = validate(&value);
    if !result.is_valid {
        return Err(ConfigError::Validation(result.errors));
    }

    Ok(serde_json::from_value(value)?)
}

/// Re-run the gate over an already-typed configuration.
pub fn load_from_config(config: &Configuration) -> Result<Configuration, ConfigError> {
    load_from_object(serde_json::to_value(config)?)
}

/// Read a configuration file into an untyped document, picking the decoder
/// from the file extension.
pub fn read_document(path: &Path) -> Result<Value, ConfigError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(ConfigError::NotFound(display));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ConfigError::UnsupportedFormat {
            extension: format!(".{}", extension),
            supported: SUPPORTED_EXTENSIONS
                .iter()
                .map(|e| format!(".{}", e))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display,
        source,
    })?;

    match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            format: "YAML",
            message: e.to_string(),
        }),
        "toml" => toml::from_str(&content).map_err(|e| ConfigError::Parse {
            format: "TOML",
            message: e.to_string(),
        }),
        _ => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            format: "JSON",
            message: e.to_string(),
        }),
    }
}

/// Load and validate configuration from a YAML, JSON or TOML file.
pub fn load_from_file(path: &Path) -> Result<Configuration, ConfigError> {
    let document = read_document(path)?;
    let config = load_from_object(document)?;

    tracing::info!(
        path = %path.display(),
        endpoints = config.endpoints.len(),
        "Configuration loaded"
    );
    Ok(config)
}
