//! Shared utilities for integration testing.
//!
//! Every helper binds on `127.0.0.1:0` so tests can run in parallel.

#![allow(dead_code)]

use std::net::SocketAddr;

use rpc_gateway::config::GatewayConfig;
use rpc_gateway::lifecycle::{start, Mode, Running, Shutdown};

/// A running set of components plus the handle to stop them.
pub struct TestStack {
    pub http_addr: Option<SocketAddr>,
    pub rpc_addr: Option<SocketAddr>,
    shutdown: Shutdown,
    running: Running,
}

impl TestStack {
    /// Base URL of the gateway.
    pub fn url(&self) -> String {
        let addr = self.http_addr.expect("stack has no gateway");
        format!("http://{}", addr)
    }

    /// Full URL of the multiply route.
    pub fn endpoint(&self) -> String {
        format!("{}/rpc/multiply", self.url())
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        self.rpc_addr.expect("stack has no rpc service")
    }

    /// Trigger shutdown and wait for every component to stop.
    pub async fn stop(self) {
        self.shutdown.trigger();
        self.running.wait().await.unwrap();
    }
}

fn local_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.gateway.bind_address = "127.0.0.1:0".into();
    config.rpc.bind_address = "127.0.0.1:0".into();
    config
}

pub async fn start_with(config: GatewayConfig, mode: Mode) -> TestStack {
    let shutdown = Shutdown::new();
    let running = start(&config, mode, &shutdown).await.unwrap();
    TestStack {
        http_addr: running.http_addr,
        rpc_addr: running.rpc_addr,
        shutdown,
        running,
    }
}

/// RPC service and gateway in one process.
pub async fn start_combined(cors: bool) -> TestStack {
    let mut config = local_config();
    config.gateway.cors = cors;
    start_with(config, Mode::Combined).await
}

/// RPC service only.
pub async fn start_service() -> TestStack {
    start_with(local_config(), Mode::Service).await
}

/// Gateway only, dialing `upstream`.
pub async fn start_gateway(upstream: SocketAddr, cors: bool) -> TestStack {
    let mut config = local_config();
    config.gateway.cors = cors;
    config.upstream.address = upstream.to_string();
    start_with(config, Mode::Gateway).await
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
