//! Response templating.
//!
//! # Data Flow
//! ```text
//! ResponseSpec.body (template-bearing JSON)
//!     + TemplateContext (params, query, body, headers of one request)
//!     → resolver.rs (recursive walk, placeholder substitution)
//!     → resolved JSON body
//! ```

pub mod context;
pub mod resolver;

pub use context::TemplateContext;
pub use resolver::{resolve_expression, Resolution, TemplateResolver};
