//! Shared utilities.

/// Environment-driven server configuration.
pub mod config;

pub use config::Config;
