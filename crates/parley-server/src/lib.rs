//! HTTP server assembly for Parley

mod auth;
mod health;
mod request_context;

use std::net::SocketAddr;

use axum::Router;
use parley_config::Config;
use parley_llm::LlmState;
use tower_http::trace::TraceLayer;

pub use auth::ApiKeys;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream client cannot be built
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let llm_state = LlmState::from_config(config)?;
        Ok(Self::with_state(config, llm_state))
    }

    /// Build the server around prepared LLM state
    pub fn with_state(config: &Config, llm_state: LlmState) -> Self {
        let mut app = Router::new();

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        // LLM routes
        app = app.merge(parley_llm::llm_router(llm_state));

        // Apply middleware layers (innermost first)

        // Request context (innermost, runs just before handlers)
        app = app.layer(axum::middleware::from_fn(request_context::request_context_middleware));

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        // API key authentication
        if config.auth.is_enabled() {
            let keys = ApiKeys::from_config(&config.auth);
            app = app.layer(axum::middleware::from_fn(move |req, next| {
                let keys = keys.clone();
                async move { auth::auth_middleware(keys, req, next).await }
            }));
        }

        Self {
            router: app,
            listen_address: config.server.listen_address_or_default(),
        }
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    async fn get(config: &Config, uri: &str) -> StatusCode {
        let router = Server::new(config).unwrap().into_router();
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        router.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_route_is_mounted() {
        assert_eq!(get(&Config::default(), "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn health_route_can_be_disabled() {
        let mut config = Config::default();
        config.server.health.enabled = false;

        assert_eq!(get(&config, "/health").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn models_require_a_key_once_configured() {
        let config = Config::from_toml_str("[auth]\napi_keys = [\"sk-client\"]\n").unwrap();

        assert_eq!(get(&config, "/v1/models").await, StatusCode::UNAUTHORIZED);
        assert_eq!(get(&config, "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn models_are_open_without_keys() {
        assert_eq!(get(&Config::default(), "/v1/models").await, StatusCode::OK);
    }
}
