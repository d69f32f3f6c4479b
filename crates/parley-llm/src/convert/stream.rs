use std::collections::HashMap;

use crate::protocol::messages::{BlockDelta, ResponseBlock, StreamEvent, Usage};
use crate::protocol::openai::{
    OpenAiErrorResponse, OpenAiStreamChoice, OpenAiStreamChunk, OpenAiStreamDelta,
    OpenAiStreamFunctionCall, OpenAiStreamToolCall,
};
use crate::sse::SseChunk;

/// Translates Messages API stream events into `OpenAI` chunks
///
/// One instance per response. Tool calls get sequential indexes of their
/// own; the Messages API content block index counts text and thinking
/// blocks too and would leave gaps.
#[derive(Debug)]
pub struct OpenAiStreamState {
    id: String,
    model: String,
    created: u64,
    include_usage: bool,
    usage: Usage,
    /// Content block index to tool call index
    tool_calls: HashMap<u32, u32>,
    next_tool_call_index: u32,
}

impl OpenAiStreamState {
    pub fn new(created: u64, include_usage: bool) -> Self {
        Self {
            id: String::new(),
            model: String::new(),
            created,
            include_usage,
            usage: Usage::default(),
            tool_calls: HashMap::new(),
            next_tool_call_index: 0,
        }
    }

    /// Translate one upstream event into zero or more client frames
    pub fn translate(&mut self, event: StreamEvent) -> Vec<SseChunk> {
        match event {
            StreamEvent::MessageStart { message } => {
                self.id = message.id;
                self.model = message.model;
                self.usage = message.usage;

                vec![self.delta_chunk(OpenAiStreamDelta {
                    role: Some("assistant".to_owned()),
                    content: Some(String::new()),
                    ..Default::default()
                })]
            }

            StreamEvent::ContentBlockStart { index, content_block } => match content_block {
                ResponseBlock::ToolUse { id, name, .. } => {
                    let tool_index = self.next_tool_call_index;
                    self.next_tool_call_index += 1;
                    self.tool_calls.insert(index, tool_index);

                    vec![self.tool_call_chunk(OpenAiStreamToolCall {
                        index: tool_index,
                        id: Some(id),
                        tool_type: Some("function".to_owned()),
                        function: Some(OpenAiStreamFunctionCall {
                            name: Some(name),
                            arguments: Some(String::new()),
                        }),
                    })]
                }
                ResponseBlock::Text { text } if !text.is_empty() => vec![self.content_chunk(text)],
                _ => Vec::new(),
            },

            StreamEvent::ContentBlockDelta { index, delta } => match delta {
                BlockDelta::TextDelta { text } => vec![self.content_chunk(text)],
                BlockDelta::ThinkingDelta { thinking } => vec![self.delta_chunk(OpenAiStreamDelta {
                    reasoning_content: Some(thinking),
                    ..Default::default()
                })],
                BlockDelta::InputJsonDelta { partial_json } => {
                    let Some(&tool_index) = self.tool_calls.get(&index) else {
                        tracing::debug!(index, "input_json_delta outside a tool call block");
                        return Vec::new();
                    };

                    vec![self.tool_call_chunk(OpenAiStreamToolCall {
                        index: tool_index,
                        id: None,
                        tool_type: None,
                        function: Some(OpenAiStreamFunctionCall {
                            name: None,
                            arguments: Some(partial_json),
                        }),
                    })]
                }
                BlockDelta::SignatureDelta { .. } | BlockDelta::Unsupported => Vec::new(),
            },

            StreamEvent::MessageDelta { delta, usage } => {
                if let Some(usage) = usage {
                    self.merge_usage(usage);
                }

                let mut chunks = vec![self.chunk(
                    vec![OpenAiStreamChoice {
                        index: 0,
                        delta: OpenAiStreamDelta::default(),
                        finish_reason: super::finish_reason(delta.stop_reason.as_deref()),
                    }],
                    None,
                )];

                if self.include_usage {
                    chunks.push(self.chunk(Vec::new(), Some(&self.usage)));
                }

                chunks
            }

            StreamEvent::MessageStop => vec![SseChunk::done()],

            StreamEvent::Error { error } => {
                vec![SseChunk::json(&OpenAiErrorResponse::new(error.kind, error.message))]
            }

            StreamEvent::ContentBlockStop { .. } | StreamEvent::Ping => Vec::new(),
        }
    }

    /// `message_delta` usage is cumulative; zero means "not reported"
    fn merge_usage(&mut self, usage: Usage) {
        if usage.input_tokens > 0 {
            self.usage.input_tokens = usage.input_tokens;
        }
        self.usage.output_tokens = usage.output_tokens;
        if usage.cache_creation_input_tokens.is_some() {
            self.usage.cache_creation_input_tokens = usage.cache_creation_input_tokens;
        }
        if usage.cache_read_input_tokens.is_some() {
            self.usage.cache_read_input_tokens = usage.cache_read_input_tokens;
        }
    }

    fn content_chunk(&self, text: String) -> SseChunk {
        self.delta_chunk(OpenAiStreamDelta {
            content: Some(text),
            ..Default::default()
        })
    }

    fn tool_call_chunk(&self, call: OpenAiStreamToolCall) -> SseChunk {
        self.delta_chunk(OpenAiStreamDelta {
            tool_calls: Some(vec![call]),
            ..Default::default()
        })
    }

    fn delta_chunk(&self, delta: OpenAiStreamDelta) -> SseChunk {
        self.chunk(
            vec![OpenAiStreamChoice {
                index: 0,
                delta,
                finish_reason: None,
            }],
            None,
        )
    }

    fn chunk(&self, choices: Vec<OpenAiStreamChoice>, usage: Option<&Usage>) -> SseChunk {
        SseChunk::json(&OpenAiStreamChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk".to_owned(),
            created: self.created,
            model: self.model.clone(),
            choices,
            usage: usage.map(super::openai::openai_usage),
        })
    }
}
