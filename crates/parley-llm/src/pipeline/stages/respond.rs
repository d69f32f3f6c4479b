use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures_util::StreamExt;
use parley_core::HttpError;

use crate::convert::{self, OpenAiStreamState};
use crate::error::LlmError;
use crate::pipeline::{ChunkStream, PipelineContext, PipelineResponse, ResponseFormat, Stage};
use crate::protocol::messages::{ErrorEnvelope, MessagesApiResponse, StreamEvent};
use crate::protocol::openai::OpenAiErrorResponse;
use crate::sse::SseChunk;
use crate::upstream::{EventStream, UpstreamReply};

/// Shapes the upstream reply into the client's envelope
pub struct ResponseStage;

#[async_trait]
impl Stage for ResponseStage {
    fn name(&self) -> &'static str {
        "respond"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<(), LlmError> {
        let Some(reply) = ctx.upstream.take() else {
            return Ok(());
        };

        let response = match (reply, ctx.format) {
            (UpstreamReply::Buffered(body), ResponseFormat::Anthropic) => {
                PipelineResponse::Buffered(body)
            }
            (UpstreamReply::Buffered(body), ResponseFormat::OpenAi { .. }) => {
                let response: MessagesApiResponse = serde_json::from_value(body)
                    .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
                let converted = convert::to_openai_response(response, unix_now());
                let body = serde_json::to_value(converted)
                    .map_err(|e| anyhow::anyhow!("failed to encode response: {e}"))?;

                PipelineResponse::Buffered(body)
            }
            (UpstreamReply::Streamed(events), ResponseFormat::Anthropic) => {
                PipelineResponse::Streamed(anthropic_stream(events))
            }
            (UpstreamReply::Streamed(events), ResponseFormat::OpenAi { include_usage }) => {
                PipelineResponse::Streamed(openai_stream(events, include_usage))
            }
        };

        ctx.response = Some(response);
        Ok(())
    }
}

/// Pass frames through, turning read failures into `error` events
fn anthropic_stream(events: EventStream) -> ChunkStream {
    Box::pin(events.map(|result| match result {
        Ok(chunk) => chunk,
        Err(e) => {
            let envelope = ErrorEnvelope::new(e.error_type(), e.client_message());
            SseChunk::named("error", serde_json::to_string(&envelope).unwrap_or_default())
        }
    }))
}

/// Translate frames into `OpenAI` chunks
fn openai_stream(events: EventStream, include_usage: bool) -> ChunkStream {
    let mut state = OpenAiStreamState::new(unix_now(), include_usage);

    let chunks = events.flat_map(move |result| {
        let chunks = match result {
            Ok(chunk) => match serde_json::from_str::<StreamEvent>(&chunk.data) {
                Ok(event) => state.translate(event),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unparseable upstream event");
                    Vec::new()
                }
            },
            Err(e) => {
                let error = OpenAiErrorResponse::new(e.error_type(), e.client_message());
                vec![SseChunk::json(&error)]
            }
        };

        futures_util::stream::iter(chunks)
    });

    Box::pin(chunks)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
