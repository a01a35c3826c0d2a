//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Own the active configuration snapshot (config + route table)
//! - Build the Axum router with its middleware stack
//! - Start and stop the listener task
//! - Validate and publish configuration reloads
//!
//! # Design Decisions
//! - Config and routes are published together through one `ArcSwap`, so
//!   a request never sees routes from one config and settings from another
//! - A reload builds the new table fully before the swap; requests that
//!   already loaded the old snapshot finish against it
//! - Listener settings are read at `start()`; a reload does not rebind

use arc_swap::{ArcSwap, ArcSwapOption};
use axum::{middleware, Router};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{load_from_config, load_from_object, ConfigError, Configuration};
use crate::http::{cors, dispatch::handle_request, response};
use crate::lifecycle::{PhaseCell, ServerPhase, Shutdown};
use crate::observability::{metrics, EventSink, ServerEvent, TracingSink};
use crate::routing::RouteTable;
use crate::template::TemplateResolver;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 100 * 1024;

/// Errors from lifecycle operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Server is already running")]
    AlreadyRunning,

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("Server task failed: {0}")]
    Task(String),
}

/// One published configuration and the routes derived from it.
#[derive(Debug)]
pub struct InnerState {
    pub config: Arc<Configuration>,
    pub routes: RouteTable,
}

impl InnerState {
    fn build(config: Configuration, events: &dyn EventSink) -> Self {
        let routes = RouteTable::build(&config.endpoints);
        for route in routes.routes() {
            events.emit(ServerEvent::RouteRegistered {
                method: route.endpoint.method.to_string(),
                path: route.pattern.to_string(),
            });
        }

        Self {
            config: Arc::new(config),
            routes,
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<InnerState>>,
    pub resolver: Arc<TemplateResolver>,
    pub events: Arc<dyn EventSink>,
}

struct RunningServer {
    shutdown: Shutdown,
    task: JoinHandle<std::io::Result<()>>,
}

/// A declarative mock HTTP API server.
pub struct MockServer {
    state: AppState,
    phase: PhaseCell,
    address: ArcSwapOption<SocketAddr>,
    running: Mutex<Option<RunningServer>>,
}

impl MockServer {
    /// Create a server from a decoded configuration document.
    pub fn new(config: Value) -> Result<Self, ConfigError> {
        Self::with_event_sink(config, Arc::new(TracingSink))
    }

    /// Create a server from an already-typed configuration.
    pub fn from_config(config: &Configuration) -> Result<Self, ConfigError> {
        let config = load_from_config(config)?;
        Ok(Self::from_validated(config, Arc::new(TracingSink)))
    }

    /// Create a server that reports through `events`.
    pub fn with_event_sink(config: Value, events: Arc<dyn EventSink>) -> Result<Self, ConfigError> {
        let config = load_from_object(config)?;
        Ok(Self::from_validated(config, events))
    }

    fn from_validated(config: Configuration, events: Arc<dyn EventSink>) -> Self {
        let inner = InnerState::build(config, events.as_ref());
        Self {
            state: AppState {
                inner: Arc::new(ArcSwap::from_pointee(inner)),
                resolver: Arc::new(TemplateResolver::new()),
                events,
            },
            phase: PhaseCell::new(),
            address: ArcSwapOption::empty(),
            running: Mutex::new(None),
        }
    }

    /// The Axum service serving the current configuration. Useful for
    /// driving requests in-process without a listener.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Bind the configured address and start serving.
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        self.phase.set(ServerPhase::Starting);
        let listener = match self.bind().await {
            Ok(listener) => listener,
            Err(e) => {
                self.phase.set(ServerPhase::Stopped);
                return Err(e);
            }
        };
        let address = match listener.local_addr() {
            Ok(address) => address,
            Err(e) => {
                self.phase.set(ServerPhase::Stopped);
                return Err(e.into());
            }
        };

        let shutdown = Shutdown::new();
        let signal = shutdown.signalled();
        let app = self.router();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(signal)
                .await
        });

        *running = Some(RunningServer { shutdown, task });
        self.address.store(Some(Arc::new(address)));
        self.phase.set(ServerPhase::Running);
        self.state.events.emit(ServerEvent::Started { address });
        Ok(address)
    }

    async fn bind(&self) -> Result<TcpListener, ServerError> {
        let address = self.config().server.bind_address();
        TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind { address, source })
    }

    /// Stop serving, letting in-flight requests finish. A no-op when the
    /// server is not running.
    pub async fn stop(&self) -> Result<(), ServerError> {
        let mut running = self.running.lock().await;
        let Some(server) = running.take() else {
            return Ok(());
        };

        self.phase.set(ServerPhase::Stopping);
        server.shutdown.trigger();
        let result = server.task.await;

        self.address.store(None);
        self.phase.set(ServerPhase::Stopped);
        self.state.events.emit(ServerEvent::Stopped);

        match result {
            Ok(served) => served.map_err(ServerError::Serve),
            Err(e) => Err(ServerError::Task(e.to_string())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase.get() == ServerPhase::Running
    }

    pub fn phase(&self) -> ServerPhase {
        self.phase.get()
    }

    /// Address the listener is bound to while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.address.load_full().map(|addr| *addr)
    }

    /// The configuration currently in effect.
    pub fn config(&self) -> Arc<Configuration> {
        self.state.inner.load().config.clone()
    }

    /// Validate `config` and, only if it is valid, swap it in together with
    /// a freshly built route table.
    pub fn update_config(&self, config: Value) -> Result<(), ConfigError> {
        let config = match load_from_object(config) {
            Ok(config) => config,
            Err(e) => {
                metrics::record_reload(false);
                self.state.events.emit(ServerEvent::ConfigRejected {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        let endpoints = config.endpoints.len();
        let listener_changed = config.server.bind_address() != self.config().server.bind_address();
        let inner = InnerState::build(config, self.state.events.as_ref());
        self.state.inner.store(Arc::new(inner));

        if listener_changed && self.is_running() {
            tracing::warn!("Listener address changed; it takes effect on the next start");
        }
        metrics::record_reload(true);
        self.state.events.emit(ServerEvent::ConfigReloaded { endpoints });
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(handle_request)
        .with_state(state.clone())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(response::panic_response))
        .layer(middleware::from_fn_with_state(state, cors::handle_cors))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
