//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway request → RPC client adapter:
//!     → timeouts.rs (connect deadline)
//!     → timeouts.rs (call deadline)
//! ```
//!
//! # Design Decisions
//! - Deadlines are configured per upstream; `None` waits indefinitely
//! - No retries: multiply calls are sent at most once
//! - No pooling: each call dials a fresh connection

pub mod timeouts;
