//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! start():
//!     Stopped → Starting → bind listener → spawn serve task → Running
//!
//! stop():
//!     Running → Stopping → trigger shutdown → drain in-flight → Stopped
//!
//! Signals (binary only, signals.rs):
//!     SIGTERM/SIGINT → stop()
//! ```
//!
//! # Design Decisions
//! - start/stop are serialized; the phase is readable without locking
//! - A failed bind returns the server to Stopped
//! - stop() on a stopped server is a no-op

pub mod shutdown;
pub mod signals;
pub mod state;

pub use shutdown::Shutdown;
pub use state::{PhaseCell, ServerPhase};
