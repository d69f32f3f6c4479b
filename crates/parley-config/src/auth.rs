use secrecy::SecretString;
use serde::Deserialize;

/// Client API key authentication
///
/// Authentication is enforced only when at least one key is configured.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Keys accepted via `x-api-key` or `Authorization: Bearer`
    #[serde(default)]
    pub api_keys: Vec<SecretString>,

    /// Path prefixes that skip authentication
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

impl AuthConfig {
    /// Whether any client key is configured
    pub fn is_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            public_paths: default_public_paths(),
        }
    }
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string()]
}
