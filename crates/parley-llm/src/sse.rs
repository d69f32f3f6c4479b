//! Server-sent event frames moved between upstream and client

use serde::Serialize;

/// Terminal payload of an `OpenAI` stream
pub const DONE: &str = "[DONE]";

/// One SSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseChunk {
    /// Event name; `None` means the default `message` event
    pub event: Option<String>,
    /// Event payload
    pub data: String,
}

impl SseChunk {
    /// Unnamed frame
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
        }
    }

    /// Named frame
    pub fn named(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            data: data.into(),
        }
    }

    /// Unnamed frame carrying `value` as JSON
    pub fn json<T: Serialize>(value: &T) -> Self {
        Self::data(serde_json::to_string(value).unwrap_or_default())
    }

    /// `data: [DONE]`
    pub fn done() -> Self {
        Self::data(DONE)
    }

    /// Whether this is the `[DONE]` terminator
    pub fn is_done(&self) -> bool {
        self.event.is_none() && self.data == DONE
    }
}
