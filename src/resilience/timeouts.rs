//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap connect and call futures with an optional deadline
//! - Keep "no deadline" as a first-class setting
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

/// Marker error for an elapsed deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline of {0:?} elapsed")]
pub struct Elapsed(pub Duration);

/// Convert an optional millisecond setting into a deadline.
pub fn from_millis(ms: Option<u64>) -> Option<Duration> {
    ms.map(Duration::from_millis)
}

/// Await `fut`, bounded by `deadline` when one is set.
pub async fn with_deadline<F, T>(deadline: Option<Duration>, fut: F) -> Result<T, Elapsed>
where
    F: Future<Output = T>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| Elapsed(limit)),
        None => Ok(fut.await),
    }
}
