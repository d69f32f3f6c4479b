/// Transport-level view of an inbound HTTP request
///
/// Captured once by the server middleware and carried into the pipeline so
/// stages can read request metadata (headers, URI) without touching axum.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// HTTP request parts (method, URI, headers, extensions)
    pub parts: http::request::Parts,
}

impl RequestContext {
    /// Wrap already-split request parts
    pub const fn new(parts: http::request::Parts) -> Self {
        Self { parts }
    }

    /// Create a minimal context for requests that did not arrive over HTTP
    ///
    /// # Panics
    ///
    /// Never in practice: the builder input is static and valid.
    pub fn empty() -> Self {
        let (parts, ()) = http::Request::builder()
            .method(http::Method::POST)
            .uri("/")
            .body(())
            .expect("valid minimal request")
            .into_parts();

        Self { parts }
    }

    /// Access request headers
    pub fn headers(&self) -> &http::HeaderMap {
        &self.parts.headers
    }

    /// Request path, recorded on the `llm_request` span
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_has_no_headers() {
        let ctx = RequestContext::empty();
        assert!(ctx.headers().is_empty());
        assert_eq!(ctx.path(), "/");
    }

    #[test]
    fn keeps_original_headers() {
        let (parts, ()) = http::Request::builder()
            .uri("/v1/messages")
            .header("anthropic-beta", "tools-2024-04-04")
            .body(())
            .unwrap()
            .into_parts();

        let ctx = RequestContext::new(parts);
        assert_eq!(ctx.path(), "/v1/messages");
        assert_eq!(ctx.headers()["anthropic-beta"], "tools-2024-04-04");
    }
}
