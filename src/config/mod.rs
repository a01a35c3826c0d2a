//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML/JSON/TOML) or hand-built document
//!     → loader.rs (decode to an untyped document)
//!     → validation.rs (field-level checks, all errors collected)
//!     → schema.rs Configuration (typed, immutable)
//!     → published with its route table as one snapshot
//!
//! On reload:
//!     watcher.rs detects change (or update_config is called)
//!     → loader.rs decodes
//!     → validation.rs validates
//!     → atomic swap of the active snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a full reload
//! - Validation runs on the untyped document so type errors are reported
//!   per field instead of as a single decode failure
//! - A rejected reload never touches the running configuration

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_from_config, load_from_file, load_from_object, ConfigError};
pub use schema::{
    ConditionalResponseSpec, Configuration, EndpointSpec, HttpMethod, ResponseSpec,
    ServerSettings,
};
pub use validation::{validate, ValidationError, ValidationResult};
