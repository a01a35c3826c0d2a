//! Declarative mock HTTP API server library.
//!
//! A configuration lists endpoints and the responses they produce; response
//! bodies may interpolate request data through `{{...}}` placeholders.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod template;

pub use config::{load_from_file, load_from_object, validate, Configuration};
pub use http::{MockServer, ServerError};
pub use template::{TemplateContext, TemplateResolver};
