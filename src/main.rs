//! path-gateway: fetch any URL through a path-encoded forward gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client                 ┌──────────────────────────────────────────────┐
//!     GET /https%3A%2F%2F…   │                 PATH GATEWAY                 │
//!     ───────────────────────┼─▶ http::server ─▶ gateway ─▶ upstream ──────┼──▶ Origin
//!                            │        ▲             │                      │
//!     ◀──────────────────────┼────────┴── rewrite ◀─┘ (location, cookies,  │
//!     rewritten response     │                         html links)         │
//!                            │                                             │
//!                            │  config · security · observability · life-  │
//!                            │  cycle                                      │
//!                            └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use path_gateway::config::{load_config, ProxyConfig};
use path_gateway::lifecycle::{shutdown_signal, Shutdown};
use path_gateway::net::load_tls_config;
use path_gateway::observability::{logging, metrics};
use path_gateway::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "path-gateway", version, about = "Path-encoded forward HTTP gateway")]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "path-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        header_rule_hosts = config.header_rules.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    match tls {
        Some(tls) => {
            let rustls = load_tls_config(&tls).await?;
            let addr = bind_address.parse()?;
            server.run_tls(addr, rustls, receiver).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            server.run(listener, receiver).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
