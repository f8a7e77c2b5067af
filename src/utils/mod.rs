//! Configuration utilities.

/// `delve.toml` loading and validation.
pub mod config;

pub use config::{ConfigError, DelveConfig};
