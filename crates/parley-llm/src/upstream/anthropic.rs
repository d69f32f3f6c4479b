use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use http::{HeaderMap, HeaderName, StatusCode};
use parley_config::{DEFAULT_BASE_URL, UpstreamConfig};
use parley_core::RequestContext;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{EventStream, Upstream, UpstreamReply};
use crate::error::LlmError;
use crate::protocol::messages::{ErrorEnvelope, MessagesApiRequest};
use crate::sse::SseChunk;

/// Messages API over HTTP
pub struct AnthropicUpstream {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    anthropic_version: String,
    timeout: Duration,
    stream_idle_timeout: Duration,
    forward_headers: Vec<HeaderName>,
}

impl AnthropicUpstream {
    /// Create from upstream configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Internal` if the HTTP client cannot be built.
    pub fn new(config: &UpstreamConfig) -> Result<Self, LlmError> {
        let base_url = match &config.base_url {
            Some(url) => url.clone(),
            None => Url::parse(DEFAULT_BASE_URL)
                .map_err(|e| anyhow::anyhow!("invalid default base URL: {e}"))?,
        };

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build upstream HTTP client: {e}"))?;

        let forward_headers = config
            .forward_headers
            .iter()
            .filter_map(|name| match HeaderName::try_from(name.as_str()) {
                Ok(name) => Some(name),
                Err(e) => {
                    tracing::warn!(header = %name, error = %e, "ignoring invalid forward header");
                    None
                }
            })
            .collect();

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            anthropic_version: config.anthropic_version.clone(),
            timeout: config.timeout,
            stream_idle_timeout: config.stream_idle_timeout,
            forward_headers,
        })
    }

    /// Build the messages endpoint URL
    fn messages_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/messages")
    }

    /// Client headers copied onto the upstream request
    fn forwarded_headers(&self, context: &RequestContext) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for name in &self.forward_headers {
            for value in context.headers().get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        headers
    }
}

#[async_trait]
impl Upstream for AnthropicUpstream {
    async fn send(
        &self,
        request: &MessagesApiRequest,
        context: &RequestContext,
    ) -> Result<Option<UpstreamReply>, LlmError> {
        let streaming = request.is_stream();

        let mut builder = self
            .client
            .post(self.messages_url())
            .header("anthropic-version", &self.anthropic_version)
            .headers(self.forwarded_headers(context))
            .json(request);

        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key.expose_secret());
        }

        tracing::debug!(model = %request.model, streaming, "sending upstream request");

        // Streamed calls only bound the wait for headers
        let response = if streaming {
            tokio::time::timeout(self.timeout, builder.send())
                .await
                .map_err(|_| LlmError::Timeout)?
        } else {
            builder.timeout(self.timeout).send().await
        }
        .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "upstream returned error");
            return Err(status_error(status, &body));
        }

        if streaming {
            let events = response.bytes_stream().eventsource().filter_map(|result| {
                let chunk = match result {
                    Ok(event) if event.data.trim().is_empty() => None,
                    Ok(event) => {
                        let name = (!event.event.is_empty() && event.event != "message")
                            .then_some(event.event);
                        Some(Ok(SseChunk {
                            event: name,
                            data: event.data,
                        }))
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "upstream stream failed");
                        Some(Err(LlmError::Streaming(e.to_string())))
                    }
                };

                async move { chunk }
            });

            let events = with_idle_timeout(Box::pin(events), self.stream_idle_timeout);
            return Ok(Some(UpstreamReply::Streamed(events)));
        }

        let body = response.bytes().await.map_err(classify)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        Ok((!value.is_null()).then_some(UpstreamReply::Buffered(value)))
    }
}

/// End `events` with a streaming error once `idle` passes without a frame
fn with_idle_timeout(events: EventStream, idle: Duration) -> EventStream {
    let guarded = futures_util::stream::unfold(Some(events), move |events| async move {
        let mut events = events?;

        match tokio::time::timeout(idle, events.next()).await {
            Ok(Some(item)) => Some((item, Some(events))),
            Ok(None) => None,
            Err(_) => {
                tracing::warn!(idle_ms = idle.as_millis(), "upstream stream stalled");
                let error = LlmError::Streaming(format!("no upstream event for {idle:?}"));
                Some((Err(error), None))
            }
        }
    });

    Box::pin(guarded)
}

fn classify(error: reqwest::Error) -> LlmError {
    if error.is_timeout() {
        LlmError::Timeout
    } else {
        tracing::warn!(error = %error, "upstream request failed");
        LlmError::Connection(error.to_string())
    }
}

/// Read a Messages API error envelope, falling back to the raw body
fn status_error(status: StatusCode, body: &str) -> LlmError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => LlmError::UpstreamStatus {
            status,
            kind: envelope.error.kind,
            message: envelope.error.message,
        },
        Err(_) => LlmError::UpstreamStatus {
            status,
            kind: "api_error".to_owned(),
            message: if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("upstream error").to_owned()
            } else {
                body.to_owned()
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_is_unwrapped() {
        let error = status_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"type":"error","error":{"type":"rate_limit_error","message":"Rate limited"}}"#,
        );

        assert!(matches!(
            error,
            LlmError::UpstreamStatus { status, kind, .. }
                if status == StatusCode::TOO_MANY_REQUESTS && kind == "rate_limit_error"
        ));
    }

    #[test]
    fn unparseable_error_body_is_kept() {
        let error = status_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(
            error,
            LlmError::UpstreamStatus { kind, message, .. }
                if kind == "api_error" && message.contains("bad gateway")
        ));
    }

    #[test]
    fn empty_error_body_uses_reason_phrase() {
        let error = status_error(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(matches!(
            error,
            LlmError::UpstreamStatus { message, .. } if message == "Service Unavailable"
        ));
    }

    #[test]
    fn only_configured_headers_are_forwarded() {
        let upstream = AnthropicUpstream::new(&UpstreamConfig::default()).unwrap();

        let request = http::Request::builder()
            .header("anthropic-beta", "prompt-caching-2024-07-31")
            .header("cookie", "session=1")
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();

        let headers = upstream.forwarded_headers(&RequestContext::new(parts));
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["anthropic-beta"], "prompt-caching-2024-07-31");
    }

    fn chunk(data: &str) -> Result<SseChunk, LlmError> {
        Ok(SseChunk {
            event: None,
            data: data.to_owned(),
        })
    }

    #[tokio::test]
    async fn stalled_stream_ends_with_streaming_error() {
        let stalled =
            futures_util::stream::iter([chunk("first")]).chain(futures_util::stream::pending());
        let mut events = with_idle_timeout(Box::pin(stalled), Duration::from_millis(50));

        assert_eq!(events.next().await.unwrap().unwrap().data, "first");
        assert!(matches!(
            events.next().await,
            Some(Err(LlmError::Streaming(message))) if message.contains("50ms")
        ));
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn steady_stream_is_untouched() {
        let steady = futures_util::stream::iter([chunk("a"), chunk("b")]);
        let events = with_idle_timeout(Box::pin(steady), Duration::from_millis(50));

        let data: Vec<_> = events.map(|item| item.unwrap().data).collect().await;
        assert_eq!(data, ["a", "b"]);
    }

    #[test]
    fn messages_url_tolerates_trailing_slash() {
        let config = UpstreamConfig {
            base_url: Some(Url::parse("http://localhost:9000/v1/").unwrap()),
            ..UpstreamConfig::default()
        };

        let upstream = AnthropicUpstream::new(&config).unwrap();
        assert_eq!(upstream.messages_url(), "http://localhost:9000/v1/messages");
    }
}
