//! The provider behind the proxy

mod anthropic;

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use parley_core::RequestContext;

pub use anthropic::AnthropicUpstream;

use crate::error::LlmError;
use crate::protocol::messages::MessagesApiRequest;
use crate::sse::SseChunk;

/// Upstream SSE frames; read failures surface as `LlmError::Streaming` items
pub type EventStream = Pin<Box<dyn Stream<Item = Result<SseChunk, LlmError>> + Send>>;

/// What the upstream produced for one call
pub enum UpstreamReply {
    /// Complete JSON body of a non-streamed call
    Buffered(serde_json::Value),
    /// Event stream of a streamed call, headers already received
    Streamed(EventStream),
}

impl fmt::Debug for UpstreamReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(body) => f.debug_tuple("Buffered").field(body).finish(),
            Self::Streamed(_) => f.write_str("Streamed(..)"),
        }
    }
}

/// A Messages API provider
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Send one request
    ///
    /// Streams when `request.stream` is set. `Ok(None)` means the upstream
    /// answered successfully with an empty body.
    async fn send(
        &self,
        request: &MessagesApiRequest,
        context: &RequestContext,
    ) -> Result<Option<UpstreamReply>, LlmError>;
}
