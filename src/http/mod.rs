//! HTTP handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve)
//!     → request id, trace (tower-http layers)
//!     → cors.rs (snapshot, preflight, CORS headers on every response)
//!     → panic guard, body limit (tower-http layers)
//!     → dispatch.rs (route lookup)
//!     → request.rs (query/body/header capture → TemplateContext)
//!     → template resolver, configured delay
//!     → response (endpoint payload, or response.rs 404/400/500)
//! ```

pub mod cors;
pub mod dispatch;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::{dispatch, DispatchError};
pub use server::{AppState, InnerState, MockServer, ServerError, MAX_BODY_BYTES};
