//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle + dispatch
//!     → events.rs (ServerEvent → injected EventSink, tracing by default)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout via tracing-subscriber (logging.rs)
//!     → Prometheus scrape endpoint (optional)
//!     → tests, through a RecordingSink
//! ```

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{EventSink, RecordingSink, ServerEvent, TracingSink};
