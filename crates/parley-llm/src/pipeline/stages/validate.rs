use async_trait::async_trait;

use crate::error::LlmError;
use crate::pipeline::{PipelineContext, Stage};
use crate::protocol::messages::{MessagesApiRequest, ToolChoice};

/// Smallest thinking budget the upstream accepts
pub const MIN_THINKING_BUDGET: u32 = 1024;

/// Rejects requests the upstream would refuse anyway
pub struct ValidateStage;

#[async_trait]
impl Stage for ValidateStage {
    fn name(&self) -> &'static str {
        "validate"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<(), LlmError> {
        validate_request(ctx.messages_request()?)
    }
}

/// Check a Messages API request for obvious mistakes
///
/// # Errors
///
/// Returns `LlmError::InvalidRequest` describing the first problem found.
pub fn validate_request(request: &MessagesApiRequest) -> Result<(), LlmError> {
    if request.model.trim().is_empty() {
        return Err(invalid("model must not be empty"));
    }

    if request.messages.is_empty() {
        return Err(invalid("messages must not be empty"));
    }

    if request.max_tokens == 0 {
        return Err(invalid("max_tokens must be at least 1"));
    }

    if let Some(ToolChoice::Tool { name, .. }) = &request.tool_choice
        && name.is_empty()
    {
        return Err(invalid("tool_choice.name must not be empty"));
    }

    if let Some(thinking) = &request.thinking
        && thinking.is_enabled()
    {
        let Some(budget) = thinking.budget_tokens else {
            return Err(invalid("thinking.budget_tokens is required when thinking is enabled"));
        };

        if budget < MIN_THINKING_BUDGET {
            return Err(invalid(&format!(
                "thinking.budget_tokens must be at least {MIN_THINKING_BUDGET}"
            )));
        }

        if budget >= request.max_tokens {
            return Err(invalid("thinking.budget_tokens must be less than max_tokens"));
        }
    }

    Ok(())
}

fn invalid(message: &str) -> LlmError {
    LlmError::InvalidRequest(message.to_owned())
}
