use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let expanded = crate::env::expand_env(raw)
            .map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded)
            .map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_retry()?;
        self.validate_upstream()?;
        self.validate_auth()?;
        Ok(())
    }

    fn validate_retry(&self) -> anyhow::Result<()> {
        if self.retry.attempts == 0 {
            anyhow::bail!("retry.attempts must be at least 1");
        }

        Ok(())
    }

    fn validate_upstream(&self) -> anyhow::Result<()> {
        let upstream = &self.upstream;

        if upstream.timeout.is_zero() {
            anyhow::bail!("upstream.timeout must be greater than 0");
        }

        if upstream.stream_idle_timeout.is_zero() {
            anyhow::bail!("upstream.stream_idle_timeout must be greater than 0");
        }

        if upstream.connect_timeout.is_zero() {
            anyhow::bail!("upstream.connect_timeout must be greater than 0");
        }

        if upstream.default_max_tokens == 0 {
            anyhow::bail!("upstream.default_max_tokens must be at least 1");
        }

        for name in &upstream.forward_headers {
            http::HeaderName::try_from(name.as_str()).map_err(|e| {
                anyhow::anyhow!("invalid upstream.forward_headers entry '{name}': {e}")
            })?;
        }

        if let Some(base_url) = &upstream.base_url
            && !matches!(base_url.scheme(), "http" | "https")
        {
            anyhow::bail!("upstream.base_url must use http or https, got '{}'", base_url.scheme());
        }

        Ok(())
    }

    fn validate_auth(&self) -> anyhow::Result<()> {
        if self.auth.api_keys.iter().any(|key| key.expose_secret().trim().is_empty()) {
            anyhow::bail!("auth.api_keys must not contain empty keys");
        }

        Ok(())
    }
}
