//! Conversion between the `OpenAI` chat format and the Messages API
//!
//! Requests go `OpenAI` to Messages, responses and stream events go back.

pub mod openai;
pub mod stream;

pub use openai::{to_messages_request, to_openai_response};
pub use stream::OpenAiStreamState;

/// Map a Messages API stop reason onto an `OpenAI` finish reason
pub fn finish_reason(stop_reason: Option<&str>) -> Option<String> {
    let reason = match stop_reason? {
        "max_tokens" => "length",
        "tool_use" => "tool_calls",
        "refusal" => "content_filter",
        _ => "stop",
    };

    Some(reason.to_owned())
}
