//! HTTP/JSON gateway in front of a binary TCP RPC service.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod rpc;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::{Mode, Shutdown};
pub use rpc::{RpcClient, RpcServer};
