use http::StatusCode;
use parley_core::HttpError;
use thiserror::Error;

/// Errors that can occur while proxying a model call
#[derive(Debug, Error)]
pub enum LlmError {
    /// Client sent a malformed or invalid request
    #[error("{0}")]
    InvalidRequest(String),

    /// Request lacks valid client credentials
    #[error("invalid or missing API key")]
    Unauthorized,

    /// Requested model is not in the registry
    #[error("Model '{model}' not found")]
    ModelNotFound { model: String },

    /// Upstream could not be reached
    #[error("failed to reach upstream: {0}")]
    Connection(String),

    /// Upstream did not answer in time
    #[error("upstream request timed out")]
    Timeout,

    /// Upstream answered with a non-success status
    #[error("{message}")]
    UpstreamStatus {
        /// Status returned by the upstream
        status: StatusCode,
        /// Error type from the upstream error envelope
        kind: String,
        /// Error message from the upstream error envelope
        message: String,
    },

    /// Upstream answered 2xx with a body that could not be understood
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    /// Upstream stream broke after headers were received
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Upstream answered successfully but produced nothing
    #[error("upstream returned no response")]
    NoResponse,

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LlmError {
    /// Whether repeating the same call may succeed
    ///
    /// Connection failures, timeouts, and upstream 408, 429 and 5xx
    /// answers are transient. Everything else fails the same way twice.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout => true,
            Self::UpstreamStatus { status, .. } => {
                matches!(status.as_u16(), 408 | 429) || status.is_server_error()
            }
            _ => false,
        }
    }
}

impl HttpError for LlmError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::ModelNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Connection(_) | Self::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::UpstreamStatus { status, .. } => *status,
            Self::Streaming(_) | Self::NoResponse | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::Unauthorized => "authentication_error",
            Self::ModelNotFound { .. } => "not_found_error",
            Self::Connection(_) => "api_connection_error",
            Self::Timeout => "timeout_error",
            Self::UpstreamStatus { kind, .. } => kind,
            Self::MalformedResponse(_) => "api_error",
            Self::Streaming(_) => "streaming_error",
            Self::NoResponse => "no_response_error",
            Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "an internal error occurred".to_owned(),
            other => other.to_string(),
        }
    }
}
