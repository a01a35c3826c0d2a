//! Mock API Server
//!
//! Serves canned, optionally templated, HTTP responses described by a
//! YAML/JSON/TOML configuration file.
//!
//! ```text
//!   config file ──▶ loader ──▶ validator ──▶ MockServer ──▶ axum listener
//!        ▲                                       ▲
//!        └── watcher (--watch) ── update_config ─┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use mock_api_server::config::{loader, validate, watcher::ConfigWatcher};
use mock_api_server::lifecycle::signals::wait_for_termination;
use mock_api_server::observability::{logging, metrics};
use mock_api_server::MockServer;

#[derive(Parser, Debug)]
#[command(name = "mock-api-server", about = "Declarative mock HTTP API server", version)]
struct Args {
    /// Path to the configuration file (.yaml, .yml, .json or .toml)
    #[arg(default_value = "mock-config.yaml")]
    config: PathBuf,

    /// Reload the configuration when the file changes
    #[arg(short, long)]
    watch: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: String,

    /// Expose Prometheus metrics on this address
    #[arg(long, value_name = "ADDR")]
    metrics_address: Option<SocketAddr>,

    /// Validate the configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(&args.log_level);

    tracing::info!(path = %args.config.display(), "Loading configuration");
    let document = loader::read_document(&args.config)?;

    if args.validate {
        let result = validate(&document);
        if result.is_valid {
            println!("Configuration is valid");
            return Ok(());
        }
        for error in &result.errors {
            eprintln!("{}", error);
        }
        return Err(format!("{} validation error(s)", result.errors.len()).into());
    }

    if let Some(addr) = args.metrics_address {
        metrics::init_metrics(addr);
    }

    let server = MockServer::new(document)?;
    let address = server.start().await?;
    tracing::info!(
        address = %address,
        endpoints = server.config().endpoints.len(),
        "Serving mock endpoints"
    );

    // Keep the watcher alive for the lifetime of the server.
    let mut _watcher = None;
    let mut updates = None;
    if args.watch {
        let (watcher, rx) = ConfigWatcher::new(&args.config);
        _watcher = Some(watcher.run()?);
        updates = Some(rx);
    }

    let shutdown = wait_for_termination();
    tokio::pin!(shutdown);
    let mut watching = updates.is_some();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            update = next_update(&mut updates), if watching => match update {
                Some(document) => {
                    if let Err(e) = server.update_config(document) {
                        tracing::error!(error = %e, "Reload rejected");
                    }
                }
                None => {
                    tracing::warn!("Config watcher stopped; hot reload disabled");
                    watching = false;
                }
            },
        }
    }

    server.stop().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn next_update(
    updates: &mut Option<tokio::sync::mpsc::UnboundedReceiver<serde_json::Value>>,
) -> Option<serde_json::Value> {
    match updates {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
