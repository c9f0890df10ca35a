//! RPC error taxonomy.
//!
//! Errors fall in three groups:
//! - `ServiceError`: raised by a method on the service side and carried back
//!   to the caller as a string in the response frame.
//! - `RpcError`: what the client adapter returns. `Connection` means the
//!   service was never reached; `Call` covers everything after the dial.
//! - `RegistryError`: method table misuse at startup.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by service methods and the server-side dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("invalid arguments")]
    InvalidArguments,

    #[error("integer overflow: {a} * {b}")]
    Overflow { a: i64, b: i64 },

    #[error("rpc: can't find method {0}")]
    UnknownMethod(String),

    #[error("rpc: malformed arguments: {0}")]
    MalformedArguments(String),

    #[error("rpc: failed to encode reply: {0}")]
    Encode(String),
}

/// Failure of a call after the connection was established.
#[derive(Debug, Error)]
pub enum CallError {
    /// The remote method returned an error.
    #[error("{0}")]
    Remote(String),

    /// The connection closed before a response arrived.
    #[error("connection is shut down")]
    Shutdown,

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),
}

/// Error returned by the RPC client adapter.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("dial tcp {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Call(#[from] CallError),
}

impl RpcError {
    /// True when the service was unreachable.
    pub fn is_connection(&self) -> bool {
        matches!(self, RpcError::Connection { .. })
    }
}

/// Method table registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("rpc: method already defined: {0}")]
    Duplicate(String),

    #[error("rpc: method name '{0}' must have the form Service.Method")]
    InvalidName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_displays_verbatim() {
        let err = RpcError::from(CallError::Remote("invalid arguments".into()));
        assert_eq!(err.to_string(), "invalid arguments");
        assert!(!err.is_connection());
    }

    #[test]
    fn connection_error_mentions_address() {
        let err = RpcError::Connection {
            addr: "127.0.0.1:1".into(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        assert!(err.is_connection());
        assert!(err.to_string().starts_with("dial tcp 127.0.0.1:1"));
    }
}
