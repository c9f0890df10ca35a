//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the RPC method table
//! - Bind the listeners the selected mode needs, before serving anything
//! - Spawn the RPC service and/or HTTP gateway
//!
//! # Design Decisions
//! - Fail fast: any bind error is fatal and names the listener
//! - In combined mode the gateway dials the in-process RPC listener
//! - The RPC service stops only after the gateway has drained, so requests
//!   accepted before shutdown can still reach it

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::{GatewayConfig, UpstreamConfig};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::{self, ListenerError};
use crate::observability::metrics;
use crate::rpc::{default_method_table, RegistryError, RpcClient, RpcServer};

/// Which components this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Mode {
    /// RPC service and HTTP gateway in one process, CORS per config.
    #[default]
    Combined,
    /// HTTP gateway only, dialing `upstream.address`.
    Gateway,
    /// RPC service only.
    Service,
}

impl Mode {
    pub fn runs_service(self) -> bool {
        matches!(self, Mode::Combined | Mode::Service)
    }

    pub fn runs_gateway(self) -> bool {
        matches!(self, Mode::Combined | Mode::Gateway)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("failed to build method table: {0}")]
    Registry(#[from] RegistryError),

    #[error("{component} server failed: {source}")]
    Serve {
        component: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} task panicked")]
    Panicked(&'static str),
}

/// Handles to the spawned servers.
#[derive(Debug)]
pub struct Running {
    pub rpc_addr: Option<SocketAddr>,
    pub http_addr: Option<SocketAddr>,
    tasks: Vec<(&'static str, JoinHandle<std::io::Result<()>>)>,
}

impl Running {
    /// Wait for every server task to finish.
    pub async fn wait(self) -> Result<(), StartupError> {
        for (component, task) in self.tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(source)) => return Err(StartupError::Serve { component, source }),
                Err(_) => return Err(StartupError::Panicked(component)),
            }
        }
        Ok(())
    }
}

/// Bind and spawn the components of `mode`.
pub async fn start(
    config: &GatewayConfig,
    mode: Mode,
    shutdown: &Shutdown,
) -> Result<Running, StartupError> {
    tracing::info!(?mode, "Starting");

    // Bind everything first so a failure aborts before anything serves.
    let rpc_listener = if mode.runs_service() {
        Some(net::bind("rpc", &config.rpc.bind_address).await?)
    } else {
        None
    };
    let http_listener = if mode.runs_gateway() {
        Some(net::bind("http", &config.gateway.bind_address).await?)
    } else {
        None
    };

    let rpc_addr = rpc_listener
        .as_ref()
        .map(|l| l.local_addr())
        .transpose()
        .map_err(|source| ListenerError::Bind {
            component: "rpc",
            address: config.rpc.bind_address.clone(),
            source,
        })?;
    let http_addr = http_listener
        .as_ref()
        .map(|l| l.local_addr())
        .transpose()
        .map_err(|source| ListenerError::Bind {
            component: "http",
            address: config.gateway.bind_address.clone(),
            source,
        })?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let methods = if rpc_listener.is_some() {
        Some(default_method_table()?)
    } else {
        None
    };

    let mut tasks = Vec::new();
    let mut gateway_done = None;

    if let Some(listener) = http_listener {
        let upstream = match rpc_addr {
            Some(addr) => UpstreamConfig {
                address: dialable(addr).to_string(),
                ..config.upstream.clone()
            },
            None => config.upstream.clone(),
        };
        tracing::info!(upstream = %upstream.address, "Gateway upstream");

        let server = HttpServer::new(config.gateway.clone(), RpcClient::new(&upstream));
        let rx = shutdown.subscribe();
        let (done_tx, done_rx) = oneshot::channel::<()>();
        gateway_done = Some(done_rx);
        tasks.push((
            "http",
            tokio::spawn(async move {
                let result = server.run(listener, rx).await;
                let _ = done_tx.send(());
                result
            }),
        ));
    }

    if let (Some(listener), Some(methods)) = (rpc_listener, methods) {
        let server = RpcServer::new(&config.rpc, methods);
        let rpc_stop = Shutdown::new();
        let rx = rpc_stop.subscribe();

        // Relay the process shutdown to the RPC service once the gateway
        // (if any) has finished draining.
        let mut outer = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = outer.recv().await;
            if let Some(done) = gateway_done {
                let _ = done.await;
            }
            rpc_stop.trigger();
        });

        tasks.push(("rpc", tokio::spawn(server.run(listener, rx))));
    }

    Ok(Running {
        rpc_addr,
        http_addr,
        tasks,
    })
}

/// Replace a wildcard bind address with loopback so it can be dialed.
fn dialable(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port())
        }
        _ => addr,
    }
}
