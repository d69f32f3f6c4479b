use serde_json::{Map, Value, json};

use crate::error::LlmError;
use crate::protocol::messages::{
    ContentBlock, ImageSource, InputMessage, MessageContent, MessagesApiRequest,
    MessagesApiResponse, Metadata, ResponseBlock, Role, SystemPrompt, Tool, ToolChoice,
    ToolResultContent, Usage,
};
use crate::protocol::openai::{
    OpenAiChoice, OpenAiChoiceMessage, OpenAiContent, OpenAiContentPart, OpenAiFunctionCall,
    OpenAiMessage, OpenAiPromptTokensDetails, OpenAiRequest, OpenAiResponse, OpenAiTool,
    OpenAiToolCall, OpenAiUsage, StopSequences,
};

/// Translate an `OpenAI` chat completion request into a Messages API request
///
/// `max_completion_tokens` wins over `max_tokens`; `default_max_tokens`
/// applies when neither is set. Penalties and `seed` have no Messages API
/// counterpart and are dropped.
///
/// # Errors
///
/// Returns `LlmError::InvalidRequest` for roles, content or tool settings
/// that cannot be expressed in the Messages API.
pub fn to_messages_request(
    request: OpenAiRequest,
    default_max_tokens: u32,
) -> Result<MessagesApiRequest, LlmError> {
    if let Some(n) = request.n
        && n != 1
    {
        return Err(LlmError::InvalidRequest(format!("n must be 1, got {n}")));
    }

    let mut system = Vec::new();
    let mut messages: Vec<InputMessage> = Vec::new();

    for message in request.messages {
        match message.role.as_str() {
            "system" | "developer" => {
                if let Some(content) = message.content {
                    system.push(flatten_text(content));
                }
            }
            "user" => {
                let content = message.content.ok_or_else(|| {
                    LlmError::InvalidRequest("user message must have content".to_owned())
                })?;
                messages.push(InputMessage {
                    role: Role::User,
                    content: user_content(content)?,
                });
            }
            "assistant" => {
                if let Some(content) = assistant_content(message.content, message.tool_calls) {
                    messages.push(InputMessage {
                        role: Role::Assistant,
                        content,
                    });
                }
            }
            "tool" => push_tool_result(&mut messages, message)?,
            other => {
                return Err(LlmError::InvalidRequest(format!("unsupported message role '{other}'")));
            }
        }
    }

    let disable_parallel = request
        .parallel_tool_calls
        .map(|parallel| !parallel)
        .filter(|disable| *disable);

    let tool_choice = match request.tool_choice {
        Some(choice) => Some(translate_tool_choice(&choice, disable_parallel)?),
        None => disable_parallel.map(|_| ToolChoice::Auto {
            disable_parallel_tool_use: disable_parallel,
        }),
    };

    let tools = request
        .tools
        .map(|tools| tools.into_iter().map(translate_tool).collect::<Result<Vec<_>, _>>())
        .transpose()?;

    Ok(MessagesApiRequest {
        model: request.model,
        messages,
        max_tokens: request
            .max_completion_tokens
            .or(request.max_tokens)
            .unwrap_or(default_max_tokens),
        system: (!system.is_empty()).then(|| SystemPrompt::Text(system.join("\n\n"))),
        temperature: request.temperature,
        top_p: request.top_p,
        top_k: None,
        stop_sequences: request.stop.map(StopSequences::into_vec),
        stream: request.stream,
        tools,
        tool_choice,
        thinking: None,
        metadata: request.user.map(|user_id| Metadata { user_id: Some(user_id) }),
        extra: Map::new(),
    })
}

/// Join the text of a message, dropping non-text parts
fn flatten_text(content: OpenAiContent) -> String {
    match content {
        OpenAiContent::Text(text) => text,
        OpenAiContent::Parts(parts) => parts
            .into_iter()
            .filter_map(|part| match part {
                OpenAiContentPart::Text { text } => Some(text),
                OpenAiContentPart::ImageUrl { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn user_content(content: OpenAiContent) -> Result<MessageContent, LlmError> {
    match content {
        OpenAiContent::Text(text) => Ok(MessageContent::Text(text)),
        OpenAiContent::Parts(parts) => parts
            .into_iter()
            .map(|part| match part {
                OpenAiContentPart::Text { text } => Ok(ContentBlock::text(text)),
                OpenAiContentPart::ImageUrl { image_url } => Ok(ContentBlock::Image {
                    source: image_source(&image_url.url)?,
                    cache_control: None,
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(MessageContent::Blocks),
    }
}

/// Turn an image URL or `data:` URI into an image source
fn image_source(url: &str) -> Result<ImageSource, LlmError> {
    let Some(data_uri) = url.strip_prefix("data:") else {
        return Ok(ImageSource::Url { url: url.to_owned() });
    };

    let (media_type, data) = data_uri.split_once(";base64,").ok_or_else(|| {
        LlmError::InvalidRequest("image data URIs must be base64 encoded".to_owned())
    })?;

    Ok(ImageSource::Base64 {
        media_type: media_type.to_owned(),
        data: data.to_owned(),
    })
}

/// Build assistant content; `None` when there is nothing to send
fn assistant_content(
    content: Option<OpenAiContent>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
) -> Option<MessageContent> {
    let text = content.map(flatten_text).filter(|text| !text.is_empty());
    let tool_calls = tool_calls.unwrap_or_default();

    if tool_calls.is_empty() {
        return text.map(MessageContent::Text);
    }

    let mut blocks: Vec<ContentBlock> = text.into_iter().map(ContentBlock::text).collect();

    blocks.extend(tool_calls.into_iter().map(|call| {
        // Models occasionally emit arguments that are not valid JSON
        let input = serde_json::from_str::<Value>(&call.function.arguments)
            .ok()
            .filter(Value::is_object)
            .unwrap_or_else(|| json!({}));

        ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
            cache_control: None,
        }
    }));

    Some(MessageContent::Blocks(blocks))
}

/// Append a tool result, sharing a user turn with adjacent results
fn push_tool_result(
    messages: &mut Vec<InputMessage>,
    message: OpenAiMessage,
) -> Result<(), LlmError> {
    let tool_use_id = message
        .tool_call_id
        .ok_or_else(|| LlmError::InvalidRequest("tool message must have tool_call_id".to_owned()))?;

    let block = ContentBlock::ToolResult {
        tool_use_id,
        content: message.content.map(|content| ToolResultContent::Text(flatten_text(content))),
        is_error: None,
        cache_control: None,
    };

    if let Some(InputMessage {
        role: Role::User,
        content: MessageContent::Blocks(blocks),
    }) = messages.last_mut()
        && matches!(blocks.last(), Some(ContentBlock::ToolResult { .. }))
    {
        blocks.push(block);
        return Ok(());
    }

    messages.push(InputMessage {
        role: Role::User,
        content: MessageContent::Blocks(vec![block]),
    });

    Ok(())
}

fn translate_tool(tool: OpenAiTool) -> Result<Tool, LlmError> {
    if tool.tool_type != "function" {
        return Err(LlmError::InvalidRequest(format!(
            "unsupported tool type '{}'",
            tool.tool_type
        )));
    }

    Ok(Tool {
        name: tool.function.name,
        description: tool.function.description,
        input_schema: Some(tool.function.parameters.unwrap_or_else(|| json!({"type": "object"}))),
        extra: Map::new(),
    })
}

fn translate_tool_choice(
    choice: &Value,
    disable_parallel_tool_use: Option<bool>,
) -> Result<ToolChoice, LlmError> {
    match choice {
        Value::String(mode) => match mode.as_str() {
            "none" => Ok(ToolChoice::None),
            "auto" => Ok(ToolChoice::Auto {
                disable_parallel_tool_use,
            }),
            "required" => Ok(ToolChoice::Any {
                disable_parallel_tool_use,
            }),
            other => Err(LlmError::InvalidRequest(format!("unsupported tool_choice '{other}'"))),
        },
        Value::Object(object) => {
            let name = object
                .get("function")
                .and_then(|function| function.get("name"))
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    LlmError::InvalidRequest("tool_choice.function.name is required".to_owned())
                })?;

            Ok(ToolChoice::Tool {
                name: name.to_owned(),
                disable_parallel_tool_use,
            })
        }
        _ => Err(LlmError::InvalidRequest(
            "tool_choice must be a string or an object".to_owned(),
        )),
    }
}

/// Translate a Messages API response into an `OpenAI` chat completion
pub fn to_openai_response(response: MessagesApiResponse, created: u64) -> OpenAiResponse {
    let mut text = String::new();
    let mut reasoning = String::new();
    let mut tool_calls = Vec::new();

    for block in response.content {
        match block {
            ResponseBlock::Text { text: part } => text.push_str(&part),
            ResponseBlock::Thinking { thinking, .. } => reasoning.push_str(&thinking),
            ResponseBlock::ToolUse { id, name, input } => tool_calls.push(OpenAiToolCall {
                id,
                tool_type: "function".to_owned(),
                function: OpenAiFunctionCall {
                    name,
                    arguments: input.to_string(),
                },
            }),
            ResponseBlock::RedactedThinking { .. } | ResponseBlock::Unsupported => {}
        }
    }

    let content = if text.is_empty() && !tool_calls.is_empty() {
        None
    } else {
        Some(text)
    };

    OpenAiResponse {
        id: response.id,
        object: "chat.completion".to_owned(),
        created,
        model: response.model,
        choices: vec![OpenAiChoice {
            index: 0,
            message: OpenAiChoiceMessage {
                role: "assistant".to_owned(),
                content,
                reasoning_content: (!reasoning.is_empty()).then_some(reasoning),
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            },
            finish_reason: super::finish_reason(response.stop_reason.as_deref()),
        }],
        usage: Some(openai_usage(&response.usage)),
    }
}

/// Fold cache counters into the prompt total
pub(crate) fn openai_usage(usage: &Usage) -> OpenAiUsage {
    let cached = usage.cache_read_input_tokens.unwrap_or(0);
    let created = usage.cache_creation_input_tokens.unwrap_or(0);
    let prompt_tokens = usage.input_tokens + created + cached;

    OpenAiUsage {
        prompt_tokens,
        completion_tokens: usage.output_tokens,
        total_tokens: prompt_tokens + usage.output_tokens,
        prompt_tokens_details: usage
            .cache_read_input_tokens
            .map(|cached_tokens| OpenAiPromptTokensDetails { cached_tokens }),
    }
}
