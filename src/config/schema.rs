//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP gateway settings (bind address, route, CORS).
    pub gateway: HttpConfig,

    /// RPC service listener settings.
    pub rpc: RpcServiceConfig,

    /// Where the gateway dials the RPC service.
    pub upstream: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address (e.g., "0.0.0.0:8081").
    pub bind_address: String,

    /// Route that accepts multiply requests.
    pub route: String,

    /// RPC method invoked for each request.
    pub method: String,

    /// Inject CORS headers and answer OPTIONS preflight requests.
    pub cors: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8081".to_string(),
            route: "/rpc/multiply".to_string(),
            method: "Calculator.Multiply".to_string(),
            cors: true,
        }
    }
}

/// RPC service listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcServiceConfig {
    /// Bind address (e.g., "0.0.0.0:1234").
    pub bind_address: String,

    /// Largest frame accepted on the wire, in bytes.
    pub max_frame_bytes: usize,
}

impl Default for RpcServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:1234".to_string(),
            max_frame_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Upstream RPC service the gateway calls into.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// RPC service address (e.g., "127.0.0.1:1234").
    pub address: String,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,

    /// Deadline for a single call (write + response) in milliseconds.
    pub call_timeout_ms: Option<u64>,

    /// Largest response frame accepted, in bytes.
    pub max_frame_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:1234".to_string(),
            connect_timeout_ms: Some(5_000),
            call_timeout_ms: Some(30_000),
            max_frame_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
