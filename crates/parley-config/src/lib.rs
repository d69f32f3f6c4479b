#![allow(clippy::must_use_candidate)]

pub mod auth;
mod duration;
mod env;
mod loader;
pub mod retry;
pub mod server;
pub mod telemetry;
pub mod upstream;

use serde::Deserialize;

pub use auth::*;
pub use retry::*;
pub use server::*;
pub use telemetry::*;
pub use upstream::*;

/// Top-level Parley configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Client authentication
    #[serde(default)]
    pub auth: AuthConfig,
    /// Upstream Messages API provider
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Retry policy for transient upstream failures
    #[serde(default)]
    pub retry: RetryConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
