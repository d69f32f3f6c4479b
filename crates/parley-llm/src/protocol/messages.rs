//! Anthropic Messages API wire format types
//!
//! Request types round-trip unknown top-level fields through `extra` so new
//! upstream parameters pass through without a release.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// -- Request types --

/// Messages API request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagesApiRequest {
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<InputMessage>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// System prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemPrompt>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Top-k sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Stop sequences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Tool definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Tool choice configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Extended thinking configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingConfig>,
    /// Request metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Parameters this proxy does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessagesApiRequest {
    /// Whether the client asked for a streamed response
    pub fn is_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    /// Whether extended thinking is switched on
    pub fn thinking_enabled(&self) -> bool {
        self.thinking.as_ref().is_some_and(ThinkingConfig::is_enabled)
    }
}

/// Conversation role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMessage {
    /// Who produced this turn
    pub role: Role,
    /// Turn content
    pub content: MessageContent,
}

/// Message content can be a string or array of content blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text (shorthand)
    Text(String),
    /// Array of content blocks
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Whether the content carries nothing at all
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Blocks(blocks) => blocks.is_empty(),
        }
    }
}

/// System prompt, either plain text or text blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemPrompt {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// Content block in a request message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        citations: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_control: Option<Value>,
    },
    /// Image content
    Image {
        source: ImageSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_control: Option<Value>,
    },
    /// Document content; the source is passed through untouched
    Document {
        source: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_control: Option<Value>,
    },
    /// Tool use request from the assistant
    ToolUse {
        id: String,
        name: String,
        input: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_control: Option<Value>,
    },
    /// Tool result from the user
    ToolResult {
        tool_use_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<ToolResultContent>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_control: Option<Value>,
    },
    /// Prior thinking returned to the model
    Thinking { thinking: String, signature: String },
    /// Prior redacted thinking returned to the model
    RedactedThinking { data: String },
    /// Any other block (`server_tool_use`, `web_search_tool_result`,
    /// `search_result`, ...), forwarded as received
    #[serde(untagged)]
    Other(Value),
}

impl ContentBlock {
    /// Text block without citations or cache control
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            citations: None,
            cache_control: None,
        }
    }
}

/// Tool result payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// Image source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// Inline base64 data
    Base64 { media_type: String, data: String },
    /// Remote image fetched by the upstream
    Url { url: String },
}

/// Tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for input parameters; absent for server tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    /// Fields of server tools (`type`, `max_uses`, ...) and cache control
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tool choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    /// Model decides
    Auto {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        disable_parallel_tool_use: Option<bool>,
    },
    /// Model must call some tool
    Any {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        disable_parallel_tool_use: Option<bool>,
    },
    /// Model must call the named tool
    Tool {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        disable_parallel_tool_use: Option<bool>,
    },
    /// Model must not call tools
    None,
}

/// Extended thinking configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingConfig {
    /// Thinking mode
    #[serde(rename = "type")]
    pub kind: ThinkingType,
    /// Token budget for thinking; required when enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_tokens: Option<u32>,
    /// Fields this proxy does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ThinkingConfig {
    pub const fn is_enabled(&self) -> bool {
        matches!(self.kind, ThinkingType::Enabled)
    }
}

/// Thinking mode
///
/// Only `enabled` triggers budget checks and the temperature override.
/// Other modes are forwarded unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingType {
    Enabled,
    Disabled,
    #[serde(untagged)]
    Other(String),
}

/// Request metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Opaque end-user identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

// -- Response types --

/// Messages API response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagesApiResponse {
    /// Response identifier
    pub id: String,
    /// Object type (always "message")
    #[serde(rename = "type", default = "message_type")]
    pub kind: String,
    /// Role (always "assistant")
    #[serde(default = "assistant_role")]
    pub role: String,
    /// Response content blocks
    #[serde(default)]
    pub content: Vec<ResponseBlock>,
    /// Model used
    pub model: String,
    /// Stop reason
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// Stop sequence that triggered the stop
    #[serde(default)]
    pub stop_sequence: Option<String>,
    /// Token usage
    #[serde(default)]
    pub usage: Usage,
}

fn message_type() -> String {
    "message".to_owned()
}

fn assistant_role() -> String {
    "assistant".to_owned()
}

/// Content block in a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    Thinking {
        thinking: String,
        #[serde(default)]
        signature: Option<String>,
    },
    RedactedThinking {
        data: String,
    },
    /// Server tool blocks and anything newer than this proxy
    #[serde(other)]
    Unsupported,
}

/// Token usage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u32>,
}

// -- Streaming types --

/// Server-sent event payloads of a streamed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Stream started
    MessageStart { message: MessagesApiResponse },
    /// New content block started
    ContentBlockStart { index: u32, content_block: ResponseBlock },
    /// Incremental content for a block
    ContentBlockDelta { index: u32, delta: BlockDelta },
    /// Content block finished
    ContentBlockStop { index: u32 },
    /// Top-level message changes
    MessageDelta {
        delta: MessageDelta,
        #[serde(default)]
        usage: Option<Usage>,
    },
    /// Stream finished
    MessageStop,
    /// Keep-alive
    Ping,
    /// Error reported mid-stream
    Error { error: ErrorDetail },
}

/// Incremental block content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockDelta {
    TextDelta {
        text: String,
    },
    InputJsonDelta {
        partial_json: String,
    },
    ThinkingDelta {
        thinking: String,
    },
    SignatureDelta {
        signature: String,
    },
    /// Citation deltas and anything newer than this proxy
    #[serde(other)]
    Unsupported,
}

/// Message-level delta
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDelta {
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
}

// -- Error types --

/// Messages API error envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always "error"
    #[serde(rename = "type")]
    pub kind: String,
    /// Error details
    pub error: ErrorDetail,
}

impl ErrorEnvelope {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: "error".to_owned(),
            error: ErrorDetail {
                kind: kind.into(),
                message: message.into(),
            },
        }
    }
}

/// Error details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unknown_request_fields_survive_a_round_trip() {
        let body = json!({
            "model": "claude-sonnet-4-20250514",
            "max_tokens": 64,
            "messages": [{"role": "user", "content": "hi"}],
            "service_tier": "auto"
        });

        let request: MessagesApiRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.extra.get("service_tier"), Some(&json!("auto")));

        let out = serde_json::to_value(&request).unwrap();
        assert_eq!(out["service_tier"], "auto");
        assert!(out.get("temperature").is_none());
    }

    #[test]
    fn parses_block_content_and_thinking() {
        let body = json!({
            "model": "m",
            "max_tokens": 4096,
            "thinking": {"type": "enabled", "budget_tokens": 2048},
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "look", "cache_control": {"type": "ephemeral"}},
                    {"type": "image", "source": {"type": "url", "url": "https://x/cat.png"}},
                    {"type": "tool_result", "tool_use_id": "toolu_1", "content": "42"}
                ]
            }]
        });

        let request: MessagesApiRequest = serde_json::from_value(body).unwrap();
        assert!(request.thinking_enabled());

        let MessageContent::Blocks(blocks) = &request.messages[0].content else {
            panic!("expected blocks");
        };
        assert_eq!(blocks.len(), 3);
        assert!(matches!(
            &blocks[1],
            ContentBlock::Image { source: ImageSource::Url { url }, .. }
                if url == "https://x/cat.png"
        ));
    }

    #[test]
    fn web_search_follow_up_turn_is_forwarded_unchanged() {
        let assistant = json!({
            "role": "assistant",
            "content": [
                {
                    "type": "server_tool_use",
                    "id": "srvtoolu_1",
                    "name": "web_search",
                    "input": {"query": "rust 2024 edition"}
                },
                {
                    "type": "web_search_tool_result",
                    "tool_use_id": "srvtoolu_1",
                    "content": [{
                        "type": "web_search_result",
                        "url": "https://blog.rust-lang.org",
                        "title": "Rust 2024",
                        "encrypted_content": "EqgfCioIARgB"
                    }]
                },
                {
                    "type": "text",
                    "text": "It shipped with 1.85.",
                    "citations": [{
                        "type": "web_search_result_location",
                        "url": "https://blog.rust-lang.org"
                    }]
                }
            ]
        });
        let body = json!({
            "model": "m",
            "max_tokens": 1024,
            "tools": [{"type": "web_search_20250305", "name": "web_search", "max_uses": 3}],
            "messages": [
                {"role": "user", "content": "When did the 2024 edition ship?"},
                assistant,
                {"role": "user", "content": [
                    {
                        "type": "search_result",
                        "source": "https://x",
                        "title": "t",
                        "content": [{"type": "text", "text": "x"}]
                    },
                    {"type": "text", "text": "And the next one?"}
                ]}
            ]
        });

        let request: MessagesApiRequest = serde_json::from_value(body).unwrap();

        let MessageContent::Blocks(blocks) = &request.messages[1].content else {
            panic!("expected blocks");
        };
        assert!(matches!(&blocks[0], ContentBlock::Other(b) if b["type"] == "server_tool_use"));
        assert!(matches!(
            &blocks[1],
            ContentBlock::Other(b) if b["type"] == "web_search_tool_result"
        ));
        assert!(matches!(&blocks[2], ContentBlock::Text { citations: Some(_), .. }));

        let out = serde_json::to_value(&request).unwrap();
        assert_eq!(out["messages"][1], assistant);
        assert_eq!(out["messages"][2]["content"][0]["type"], "search_result");
    }

    #[test]
    fn unrecognised_thinking_modes_are_kept() {
        let body = json!({
            "model": "m",
            "max_tokens": 64,
            "thinking": {"type": "adaptive", "effort": "high"},
            "messages": [{"role": "user", "content": "hi"}]
        });

        let request: MessagesApiRequest = serde_json::from_value(body).unwrap();
        assert!(!request.thinking_enabled());

        let thinking = request.thinking.as_ref().unwrap();
        assert_eq!(thinking.kind, ThinkingType::Other("adaptive".to_owned()));

        let out = serde_json::to_value(&request).unwrap();
        assert_eq!(out["thinking"], json!({"type": "adaptive", "effort": "high"}));
    }

    #[test]
    fn unknown_stream_blocks_do_not_fail_parsing() {
        let event: StreamEvent = serde_json::from_value(json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "citations_delta", "citation": {}}
        }))
        .unwrap();

        assert_eq!(
            event,
            StreamEvent::ContentBlockDelta {
                index: 0,
                delta: BlockDelta::Unsupported
            }
        );
    }

    #[test]
    fn tool_choice_none_is_tagged() {
        let choice: ToolChoice = serde_json::from_value(json!({"type": "none"})).unwrap();
        assert_eq!(choice, ToolChoice::None);
    }
}
