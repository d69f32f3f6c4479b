use http::StatusCode;

/// Domain error that knows how it should look on the wire
///
/// The handler layer renders these in the envelope of the endpoint that
/// failed (Anthropic or `OpenAI` style), so domain crates never touch axum.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error type (e.g. `invalid_request_error`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;

    /// Whether the caller is at fault
    ///
    /// Client faults are logged at `debug`, everything else at `warn`.
    fn is_client_fault(&self) -> bool {
        self.status_code().is_client_error()
    }
}
