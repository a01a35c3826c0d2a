//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (per-method lookup)
//!     → matcher.rs (segment-wise pattern match, bind :params)
//!     → Return: matched endpoint + params, or no match
//!
//! Route Compilation (at start and on every accepted reload):
//!     EndpointSpec[]
//!     → compile path patterns
//!     → collapse duplicate (method, shape) pairs, last wins
//!     → freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Tables are never mutated once built; a reload builds a new one
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use matcher::PathPattern;
pub use router::{Route, RouteMatch, RouteTable};
