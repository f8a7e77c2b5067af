//! API request handlers.

/// Liveness probe.
pub mod health;
/// Deep research endpoints, batch and streaming.
pub mod research;
