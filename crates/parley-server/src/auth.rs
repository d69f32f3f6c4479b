use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use parley_config::AuthConfig;
use parley_llm::{ErrorFormat, LlmError, error_response};
use secrecy::{ExposeSecret, SecretString};

/// Static client keys and the paths that skip them
#[derive(Clone)]
pub struct ApiKeys {
    keys: Arc<[SecretString]>,
    public_paths: Arc<[String]>,
}

impl ApiKeys {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            keys: config.api_keys.clone().into(),
            public_paths: config.public_paths.clone().into(),
        }
    }

    fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|public| path.starts_with(public.as_str()))
    }

    fn accepts(&self, presented: &str) -> bool {
        self.keys.iter().any(|key| key.expose_secret() == presented)
    }
}

/// Require a configured key in `x-api-key` or `Authorization: Bearer`
///
/// Rejections use the error envelope of the endpoint being called.
pub async fn auth_middleware(keys: ApiKeys, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();

    if keys.is_public(&path) {
        return next.run(request).await;
    }

    let presented = presented_key(&request);
    let key_present = presented.is_some();

    if presented.is_some_and(|key| keys.accepts(key)) {
        return next.run(request).await;
    }

    tracing::debug!(path = %path, key_present, "rejecting unauthenticated request");
    error_response(&LlmError::Unauthorized, ErrorFormat::for_path(&path))
}

fn presented_key(request: &Request) -> Option<&str> {
    let headers = request.headers();

    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(key);
    }

    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
