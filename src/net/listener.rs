//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve and bind configured addresses
//! - Turn bind failures into a single clear, fatal error
//!
//! # Design Decisions
//! - No accept-side connection limit; every connection is served
//! - Bind errors name the component so startup output is unambiguous

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured address is not a socket address.
    #[error("invalid {component} listener address '{address}': {source}")]
    InvalidAddress {
        component: &'static str,
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// Failed to bind to address.
    #[error("failed to bind {component} listener on {address}: {source}")]
    Bind {
        component: &'static str,
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bind a TCP listener for `component` on `address`.
pub async fn bind(component: &'static str, address: &str) -> Result<TcpListener, ListenerError> {
    let addr: SocketAddr = address.parse().map_err(|source| ListenerError::InvalidAddress {
        component,
        address: address.to_string(),
        source,
    })?;

    let listener = TcpListener::bind(addr).await.map_err(|source| ListenerError::Bind {
        component,
        address: address.to_string(),
        source,
    })?;

    let local_addr = listener.local_addr().map_err(|source| ListenerError::Bind {
        component,
        address: address.to_string(),
        source,
    })?;

    tracing::info!(
        component,
        address = %local_addr,
        "Listener bound"
    );

    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let listener = bind("rpc", "127.0.0.1:0").await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn second_bind_on_same_port_fails_with_context() {
        let first = bind("rpc", "127.0.0.1:0").await.unwrap();
        let taken = first.local_addr().unwrap().to_string();

        let err = bind("rpc", &taken).await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("failed to bind rpc listener on"));
        assert!(message.contains(&taken));
    }

    #[tokio::test]
    async fn rejects_unparsable_address() {
        let err = bind("http", "localhost").await.unwrap_err();
        assert!(matches!(err, ListenerError::InvalidAddress { component: "http", .. }));
    }
}
