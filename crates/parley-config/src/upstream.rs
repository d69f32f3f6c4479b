use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Default Anthropic API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header value
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

/// Upstream Messages API provider
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL; `/messages` is appended
    #[serde(default)]
    pub base_url: Option<Url>,
    /// API key sent as `x-api-key`
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Value of the `anthropic-version` header
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,
    /// Total timeout for buffered calls, and time-to-headers for streamed calls
    #[serde(default = "default_timeout", deserialize_with = "crate::duration::deserialize")]
    pub timeout: Duration,
    /// Longest silence allowed between events of a streamed call
    #[serde(
        default = "default_stream_idle_timeout",
        deserialize_with = "crate::duration::deserialize"
    )]
    pub stream_idle_timeout: Duration,
    /// TCP connect timeout
    #[serde(
        default = "default_connect_timeout",
        deserialize_with = "crate::duration::deserialize"
    )]
    pub connect_timeout: Duration,
    /// `max_tokens` used when an `OpenAI`-style request omits it
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,
    /// Client request headers copied onto the upstream request
    #[serde(default = "default_forward_headers")]
    pub forward_headers: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            anthropic_version: default_anthropic_version(),
            timeout: default_timeout(),
            stream_idle_timeout: default_stream_idle_timeout(),
            connect_timeout: default_connect_timeout(),
            default_max_tokens: default_max_tokens(),
            forward_headers: default_forward_headers(),
        }
    }
}

fn default_anthropic_version() -> String {
    DEFAULT_ANTHROPIC_VERSION.to_string()
}

const fn default_timeout() -> Duration {
    Duration::from_secs(600)
}

const fn default_stream_idle_timeout() -> Duration {
    Duration::from_secs(120)
}

const fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_max_tokens() -> u32 {
    4096
}

fn default_forward_headers() -> Vec<String> {
    vec!["anthropic-beta".to_string()]
}
