//! smock: a configuration-driven mock data server.
//!
//! ```text
//!   request ──▶ http::server ──▶ routing::Resolver ──▶ actions::Executor ──▶ store
//!                  │                   │                       │               │
//!            request id,          static table,           read / write /   per-file
//!            trace, limits        templates, path         append / delete  locks, atomic
//!                                 inference, dynamic                       replace
//! ```
//!
//! The route table can be swapped at runtime when `reload.enabled` is set;
//! in-flight requests finish against the table they started with.

use std::path::{Path, PathBuf};

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use smock::config::{load_startup_config, ConfigWatcher, DEFAULT_CONFIG_PATH};
use smock::observability::{logging, metrics};
use smock::store::DocumentWatcher;
use smock::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "smock", version)]
#[command(about = "Serve flat JSON documents as a mock REST API", long_about = None)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(config) = load_startup_config(&cli.config)? else {
        return Err(format!(
            "no config file found at {} and no default document root present",
            cli.config.display()
        )
        .into());
    };

    logging::init(&config.observability);
    tracing::info!("smock v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        db_root = %config.storage.db_root,
        routes = config.routes.len(),
        dynamic_route = config.storage.dynamic_route,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    // Watchers stop when dropped, so keep them until the server returns.
    let (_config_watcher, config_updates) = if config.reload.enabled {
        let (watcher, updates) = ConfigWatcher::new(&cli.config);
        (Some(watcher.run()?), updates)
    } else {
        let (_tx, updates) = mpsc::unbounded_channel();
        (None, updates)
    };

    let _document_watcher = if config.storage.watch_documents {
        Some(DocumentWatcher::new(Path::new(&config.storage.db_root)).run()?)
    } else {
        None
    };

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
