//! Response handling and error mapping.
//!
//! # Responsibilities
//! - Map every gateway failure to an HTTP status
//! - Render failures as a plain-text, human-readable body
//!
//! # Status Mapping
//! ```text
//! wrong verb             → 405 Method Not Allowed
//! undecodable JSON body  → 400 Bad Request
//! RPC service unreachable → 500 Internal Server Error
//! RPC call failed        → 500 Internal Server Error
//! ```

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::rpc::RpcError;

/// Everything that can go wrong while serving a gateway request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Only POST method is allowed")]
    MethodNotAllowed,

    #[error("Invalid request payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request payload: EOF")]
    EmptyBody,

    #[error("Error connecting to RPC server: {0}")]
    Connection(#[source] RpcError),

    #[error("Error calling RPC method: {0}")]
    Call(#[source] RpcError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Decode(_) | GatewayError::EmptyBody => StatusCode::BAD_REQUEST,
            GatewayError::Connection(_) | GatewayError::Call(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<RpcError> for GatewayError {
    fn from(err: RpcError) -> Self {
        if err.is_connection() {
            GatewayError::Connection(err)
        } else {
            GatewayError::Call(err)
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), format!("{self}\n")).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::CallError;

    #[test]
    fn rpc_errors_split_by_kind() {
        let conn = GatewayError::from(RpcError::Connection {
            addr: "127.0.0.1:1234".into(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        });
        assert!(matches!(conn, GatewayError::Connection(_)));
        assert!(conn.to_string().starts_with("Error connecting to RPC server: dial tcp"));

        let call = GatewayError::from(RpcError::from(CallError::Remote("invalid arguments".into())));
        assert!(matches!(call, GatewayError::Call(_)));
        assert_eq!(call.to_string(), "Error calling RPC method: invalid arguments");
    }

    #[test]
    fn statuses() {
        assert_eq!(GatewayError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        let decode = serde_json::from_str::<u8>("x").unwrap_err();
        assert_eq!(GatewayError::from(decode).status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn renders_plain_text_body() {
        let response = GatewayError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Only POST method is allowed\n");
    }
}
