//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured address
//!     → listener.rs (parse, bind, fatal on failure)
//!     → rpc::server / http::server accept loops
//!     → connection.rs (IDs and live-connection tracking)
//! ```
//!
//! # Design Decisions
//! - Binding happens before any serving starts
//! - Each RPC connection tracked for graceful shutdown

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{bind, ListenerError};
