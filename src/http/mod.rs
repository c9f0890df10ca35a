//! HTTP gateway subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → request.rs (assign / propagate request ID)
//!     → cors.rs (CORS headers, OPTIONS short-circuit; optional)
//!     → server.rs (verb check, JSON decode, RPC call)
//!     → response.rs (error → status + message)
//!     → Send to client
//! ```

pub mod cors;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::GatewayError;
pub use server::{AppState, HttpServer};
