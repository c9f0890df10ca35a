//! Binary RPC subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway handler
//!     → client.rs (dial, one call, close)
//!     → protocol.rs (length-delimited bitcode frames over TCP)
//!     → server.rs (accept, per-connection serve loop)
//!     → service.rs (method table → Calculator)
//!     → back along the same path
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod server;
pub mod service;

pub use client::{RpcClient, RpcConnection};
pub use error::{CallError, RegistryError, RpcError, ServiceError};
pub use protocol::{CallArguments, CallResult, MULTIPLY_METHOD};
pub use server::RpcServer;
pub use service::{default_method_table, register_calculator, Arith, Calculator, MethodTable};
