//! RPC Gateway
//!
//! Exposes `Calculator.Multiply` as an HTTP/JSON endpoint.
//!
//! # Architecture Overview
//!
//! ```text
//!     HTTP client                       GATEWAY                          RPC SERVICE
//!     ───────────                       ───────                          ───────────
//!     POST /rpc/multiply  ──▶  http::server (decode JSON)
//!       {"A": 3, "B": 4}                     │
//!                                            ▼
//!                                  rpc::client (dial, one call)  ──▶  rpc::server (accept)
//!                                                                          │
//!                                                                          ▼
//!                                                                  rpc::service (Arith)
//!                                                                          │
//!     {"result": 12}  ◀──  http::response ◀── rpc::client  ◀────────────────┘
//! ```
//!
//! `--mode combined` runs both halves in one process; `gateway` and
//! `service` run one half each.

use std::path::PathBuf;

use clap::Parser;

use rpc_gateway::config::resolve_config;
use rpc_gateway::lifecycle::{signals, startup, Mode, Shutdown};
use rpc_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "rpc-gateway")]
#[command(about = "HTTP/JSON gateway for the Calculator RPC service", long_about = None)]
struct Cli {
    /// Path to a TOML config file (falls back to RPC_GATEWAY_CONFIG).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Components to run.
    #[arg(short, long, value_enum, default_value_t = Mode::Combined)]
    mode: Mode,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref())?;
    logging::init_logging(&config.observability);

    tracing::info!("rpc-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        http = %config.gateway.bind_address,
        rpc = %config.rpc.bind_address,
        upstream = %config.upstream.address,
        cors = config.gateway.cors,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let running = match startup::start(&config, cli.mode, &shutdown).await {
        Ok(running) => running,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    signals::wait_for_shutdown().await;
    shutdown.trigger();
    running.wait().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
