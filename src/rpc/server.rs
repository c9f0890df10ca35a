//! RPC service: accept loop and per-connection serve loop.
//!
//! # Responsibilities
//! - Accept TCP connections on a bound listener
//! - Serve each connection on its own task
//! - Decode request frames, dispatch through the method table, reply
//! - Stop accepting on shutdown and let live connections finish
//!
//! # Design Decisions
//! - No connection limit; one task per accepted connection
//! - Accept errors are logged and the loop continues
//! - A frame that cannot be decoded closes only that connection
//! - Method errors are written back as response errors, never dropped

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::RpcServiceConfig;
use crate::net::{ConnectionGuard, ConnectionTracker};
use crate::observability::metrics;
use crate::rpc::protocol::{decode_frame, encode_frame, framed, RequestFrame, ResponseFrame};
use crate::rpc::service::MethodTable;

/// How long shutdown waits for live connections before returning.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// The RPC service.
#[derive(Debug, Clone)]
pub struct RpcServer {
    methods: Arc<MethodTable>,
    tracker: ConnectionTracker,
    max_frame_bytes: usize,
}

impl RpcServer {
    pub fn new(config: &RpcServiceConfig, methods: MethodTable) -> Self {
        Self {
            methods: Arc::new(methods),
            tracker: ConnectionTracker::new(),
            max_frame_bytes: config.max_frame_bytes,
        }
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Accept connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            methods = ?self.methods.method_names(),
            "RPC server listening"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let guard = self.tracker.track(peer);
                            tracing::debug!(connection_id = %guard.id(), peer = %peer, "Connection accepted");
                            if let Err(e) = stream.set_nodelay(true) {
                                tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
                            }
                            let server = self.clone();
                            tokio::spawn(async move {
                                server.serve_connection(stream, guard).await;
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Connection error");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("RPC server received shutdown signal, no longer accepting");
                    break;
                }
            }
        }

        drop(listener);
        if !self.tracker.wait_idle(DRAIN_TIMEOUT).await {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "RPC connections still open after drain timeout"
            );
        }
        tracing::info!("RPC server stopped");
        Ok(())
    }

    /// Serve one connection until the peer closes it.
    pub async fn serve_connection<T>(&self, io: T, guard: ConnectionGuard)
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let mut transport = framed(io, self.max_frame_bytes);

        while let Some(next) = transport.next().await {
            let raw = match next {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(connection_id = %guard.id(), error = %e, "Read failed, closing connection");
                    break;
                }
            };

            let request: RequestFrame = match decode_frame(&raw) {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!(connection_id = %guard.id(), error = %e, "Malformed request frame, closing connection");
                    break;
                }
            };

            let response = self.handle(request);
            if let Err(e) = transport.send(encode_frame(&response)).await {
                tracing::warn!(connection_id = %guard.id(), error = %e, "Write failed, closing connection");
                break;
            }
        }

        tracing::debug!(connection_id = %guard.id(), peer = %guard.peer(), "Connection finished");
    }

    fn handle(&self, request: RequestFrame) -> ResponseFrame {
        let RequestFrame {
            seq,
            service_method,
            body,
        } = request;

        match self.methods.dispatch(&service_method, &body) {
            Ok(reply) => {
                metrics::record_rpc_call(&service_method, true);
                ResponseFrame::ok(seq, service_method, reply)
            }
            Err(e) => {
                tracing::debug!(seq, method = %service_method, error = %e, "RPC method returned error");
                metrics::record_rpc_call(&service_method, false);
                ResponseFrame::err(seq, service_method, e)
            }
        }
    }
}
