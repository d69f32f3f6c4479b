use std::fmt;
use std::pin::Pin;

use futures_util::Stream;

use crate::sse::SseChunk;

/// Client frames, errors already rendered in the client's envelope
pub type ChunkStream = Pin<Box<dyn Stream<Item = SseChunk> + Send>>;

/// Final product of a pipeline run
pub enum PipelineResponse {
    /// JSON body
    Buffered(serde_json::Value),
    /// Server-sent events
    Streamed(ChunkStream),
}

impl fmt::Debug for PipelineResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(body) => f.debug_tuple("Buffered").field(body).finish(),
            Self::Streamed(_) => f.write_str("Streamed(..)"),
        }
    }
}

#[cfg(feature = "http")]
mod http_response {
    use std::convert::Infallible;

    use axum::Json;
    use axum::response::sse::{Event, KeepAlive, Sse};
    use axum::response::{IntoResponse, Response};
    use futures_util::StreamExt;

    use super::PipelineResponse;
    use crate::sse::SseChunk;

    impl IntoResponse for PipelineResponse {
        fn into_response(self) -> Response {
            match self {
                Self::Buffered(body) => Json(body).into_response(),
                Self::Streamed(chunks) => {
                    let events = chunks.map(|chunk| Ok::<_, Infallible>(event(chunk)));
                    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
                }
            }
        }
    }

    fn event(chunk: SseChunk) -> Event {
        let event = Event::default().data(chunk.data);
        match chunk.event {
            Some(name) => event.event(name),
            None => event,
        }
    }
}
