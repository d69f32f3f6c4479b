use std::net::SocketAddr;

use serde::Deserialize;

/// Port used when no listen address is configured
pub const DEFAULT_PORT: u16 = 5201;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    #[serde(default)]
    pub health: HealthConfig,
}

impl ServerConfig {
    /// Configured listen address, or `0.0.0.0:5201`
    pub fn listen_address_or_default(&self) -> SocketAddr {
        self.listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))
    }
}

/// Liveness route served on the main listener
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HealthConfig {
    /// Mount the route at all
    pub enabled: bool,
    /// Route path; must be listed in `auth.public_paths` to skip auth
    pub path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/health".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_address_defaults_to_all_interfaces() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_address_or_default(), SocketAddr::from(([0, 0, 0, 0], 5201)));
    }

    #[test]
    fn health_section_fills_missing_fields() {
        let config: ServerConfig = toml::from_str("[health]\npath = \"/livez\"\n").unwrap();

        assert!(config.health.enabled);
        assert_eq!(config.health.path, "/livez");
    }
}
