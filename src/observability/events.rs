//! Structured server events.
//!
//! Lifecycle and dispatch code reports what happened through an
//! [`EventSink`] instead of logging directly, so embedding code and tests can
//! observe the server without capturing process output.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Something worth reporting about the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Started { address: SocketAddr },
    Stopped,
    RouteRegistered { method: String, path: String },
    ConfigReloaded { endpoints: usize },
    ConfigRejected { reason: String },
    RequestServed { method: String, path: String, status: u16, elapsed: Duration },
    RouteNotFound { method: String, path: String },
    HandlerFailed { method: String, path: String, message: String },
}

/// Receiver of [`ServerEvent`]s.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ServerEvent);
}

/// Default sink: forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ServerEvent) {
        match event {
            ServerEvent::Started { address } => {
                tracing::info!(address = %address, "Mock API server running")
            }
            ServerEvent::Stopped => tracing::info!("Mock API server stopped"),
            ServerEvent::RouteRegistered { method, path } => {
                tracing::debug!(method = %method, path = %path, "Registered route")
            }
            ServerEvent::ConfigReloaded { endpoints } => {
                tracing::info!(endpoints, "Configuration updated and routes reloaded")
            }
            ServerEvent::ConfigRejected { reason } => {
                tracing::warn!(reason = %reason, "Configuration rejected, keeping current")
            }
            ServerEvent::RequestServed { method, path, status, elapsed } => tracing::debug!(
                method = %method,
                path = %path,
                status,
                elapsed_ms = elapsed.as_millis() as u64,
                "Request served"
            ),
            ServerEvent::RouteNotFound { method, path } => {
                tracing::debug!(method = %method, path = %path, "No route matched")
            }
            ServerEvent::HandlerFailed { method, path, message } => tracing::error!(
                method = %method,
                path = %path,
                error = %message,
                "Error handling request"
            ),
        }
    }
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ServerEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of the events seen so far.
    pub fn events(&self) -> Vec<ServerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ServerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
