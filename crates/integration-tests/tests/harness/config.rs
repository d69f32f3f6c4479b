//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::time::Duration;

use parley_config::{Config, ServerConfig};
use secrecy::SecretString;

/// Upstream key the builder configures; the mock records what it receives
pub const UPSTREAM_KEY: &str = "sk-ant-test";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal config pointed at a mock upstream, retrying fast
    pub fn new(upstream_base_url: &str) -> Self {
        let mut config = Config {
            server: ServerConfig {
                listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                ..ServerConfig::default()
            },
            ..Config::default()
        };

        config.upstream.base_url = Some(upstream_base_url.parse().expect("valid URL"));
        config.upstream.api_key = Some(SecretString::from(UPSTREAM_KEY.to_owned()));
        config.retry.interval = Duration::from_millis(10);

        Self { config }
    }

    /// Set the retry budget
    pub fn with_retry(mut self, attempts: u32, interval: Duration) -> Self {
        self.config.retry.attempts = attempts;
        self.config.retry.interval = interval;
        self
    }

    /// Require one of `keys` from clients
    pub fn with_api_keys(mut self, keys: &[&str]) -> Self {
        self.config.auth.api_keys = keys
            .iter()
            .map(|key| SecretString::from((*key).to_owned()))
            .collect();
        self
    }

    /// Bound upstream calls
    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.config.upstream.timeout = timeout;
        self
    }

    /// Bound the silence between streamed upstream events
    pub fn with_stream_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.upstream.stream_idle_timeout = timeout;
        self
    }

    /// `max_tokens` for `OpenAI` requests that omit it
    pub fn with_default_max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.upstream.default_max_tokens = max_tokens;
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
