//! Server phase tracking.
//!
//! ```text
//! Stopped → Starting → Running → Stopping → Stopped
//!              └── bind failure ──→ Stopped
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerPhase {
    Stopped = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
}

impl ServerPhase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ServerPhase::Starting,
            2 => ServerPhase::Running,
            3 => ServerPhase::Stopping,
            _ => ServerPhase::Stopped,
        }
    }
}

impl fmt::Display for ServerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerPhase::Stopped => "stopped",
            ServerPhase::Starting => "starting",
            ServerPhase::Running => "running",
            ServerPhase::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Lock-free cell holding the current phase, readable from sync code.
#[derive(Debug)]
pub struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(ServerPhase::Stopped as u8))
    }

    pub fn get(&self) -> ServerPhase {
        ServerPhase::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, phase: ServerPhase) {
        let previous = ServerPhase::from_u8(self.0.swap(phase as u8, Ordering::AcqRel));
        tracing::trace!(from = %previous, to = %phase, "Server phase changed");
    }
}

impl Default for PhaseCell {
    fn default() -> Self {
        Self::new()
    }
}
