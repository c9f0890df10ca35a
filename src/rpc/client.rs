//! RPC client adapter.
//!
//! Each [`RpcClient::call`] dials the service, issues exactly one call and
//! releases the connection. The open connection lives in an [`RpcConnection`]
//! value scoped to the call, so the socket is closed on every exit path.

use std::time::Duration;

use bitcode::{Decode, Encode};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;

use crate::config::UpstreamConfig;
use crate::resilience::timeouts::{from_millis, with_deadline};
use crate::rpc::error::{CallError, RpcError};
use crate::rpc::protocol::{
    decode_frame, encode_frame, framed, next_seq, CallArguments, CallResult, FrameTransport,
    RequestFrame, ResponseFrame, MULTIPLY_METHOD,
};

/// Dials the RPC service once per call.
#[derive(Debug, Clone)]
pub struct RpcClient {
    addr: String,
    connect_timeout: Option<Duration>,
    call_timeout: Option<Duration>,
    max_frame_bytes: usize,
}

impl RpcClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            addr: config.address.clone(),
            connect_timeout: from_millis(config.connect_timeout_ms),
            call_timeout: from_millis(config.call_timeout_ms),
            max_frame_bytes: config.max_frame_bytes,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Open a connection to the service.
    pub async fn connect(&self) -> Result<RpcConnection, RpcError> {
        let dial = TcpStream::connect(self.addr.as_str());
        let stream = match with_deadline(self.connect_timeout, dial).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(RpcError::Connection {
                    addr: self.addr.clone(),
                    source,
                })
            }
            Err(elapsed) => {
                return Err(RpcError::Connection {
                    addr: self.addr.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::TimedOut, elapsed),
                })
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
        }

        Ok(RpcConnection {
            transport: framed(stream, self.max_frame_bytes),
            call_timeout: self.call_timeout,
        })
    }

    /// Dial, call `method` once with `args`, and close.
    pub async fn call<A, R>(&self, method: &str, args: &A) -> Result<R, RpcError>
    where
        A: Encode,
        R: for<'de> Decode<'de>,
    {
        let mut conn = self.connect().await?;
        let reply = conn.call(method, args).await;
        conn.close().await;
        reply.map_err(RpcError::from)
    }

    /// `Calculator.Multiply`.
    pub async fn multiply(&self, args: CallArguments) -> Result<CallResult, RpcError> {
        self.call(MULTIPLY_METHOD, &args).await
    }
}

/// A live connection to the RPC service. Dropping it closes the socket.
#[derive(Debug)]
pub struct RpcConnection {
    transport: FrameTransport<TcpStream>,
    call_timeout: Option<Duration>,
}

impl RpcConnection {
    /// Issue one call and wait for its response.
    pub async fn call<A, R>(&mut self, method: &str, args: &A) -> Result<R, CallError>
    where
        A: Encode,
        R: for<'de> Decode<'de>,
    {
        let request = RequestFrame {
            seq: next_seq(),
            service_method: method.to_string(),
            body: bitcode::encode(args),
        };
        let body = self.round_trip(request).await?;
        decode_frame(&body)
    }

    /// Send a prepared request frame and return the raw reply body.
    pub async fn round_trip(&mut self, request: RequestFrame) -> Result<Vec<u8>, CallError> {
        with_deadline(self.call_timeout, exchange(&mut self.transport, &request))
            .await
            .map_err(|elapsed| CallError::Timeout(elapsed.0))?
    }

    /// Flush and shut down the write half.
    pub async fn close(mut self) {
        if let Err(e) = SinkExt::<Bytes>::close(&mut self.transport).await {
            tracing::trace!(error = %e, "Error while closing RPC connection");
        }
    }
}

async fn exchange(
    transport: &mut FrameTransport<TcpStream>,
    request: &RequestFrame,
) -> Result<Vec<u8>, CallError> {
    transport.send(encode_frame(request)).await?;
    let raw = match transport.next().await {
        Some(raw) => raw?,
        None => return Err(CallError::Shutdown),
    };

    let response: ResponseFrame = decode_frame(&raw)?;
    if response.seq != request.seq {
        return Err(CallError::Protocol(format!(
            "response seq {} does not match request seq {}",
            response.seq, request.seq
        )));
    }
    match response.error {
        Some(message) => Err(CallError::Remote(message)),
        None => Ok(response.body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_service_is_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RpcClient::new(&UpstreamConfig {
            address: addr.to_string(),
            ..UpstreamConfig::default()
        });
        let err = client.multiply(CallArguments::new(1, 2)).await.unwrap_err();
        assert!(err.is_connection(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn peer_hangup_mid_call_is_shutdown() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let client = RpcClient::new(&UpstreamConfig {
            address: addr.to_string(),
            ..UpstreamConfig::default()
        });
        let err = client.multiply(CallArguments::new(1, 2)).await.unwrap_err();
        assert!(
            matches!(err, RpcError::Call(CallError::Shutdown | CallError::Transport(_))),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn silent_service_hits_call_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let client = RpcClient::new(&UpstreamConfig {
            address: addr.to_string(),
            call_timeout_ms: Some(50),
            ..UpstreamConfig::default()
        });
        let err = client.multiply(CallArguments::new(1, 2)).await.unwrap_err();
        assert!(
            matches!(err, RpcError::Call(CallError::Timeout(d)) if d == Duration::from_millis(50)),
            "unexpected error: {err}"
        );
    }
}
