use async_trait::async_trait;

use crate::convert;
use crate::error::LlmError;
use crate::pipeline::{PipelineContext, RequestBody, Stage};

/// Turns an `OpenAI` chat request into a Messages API request
pub struct TranslateStage {
    default_max_tokens: u32,
}

impl TranslateStage {
    pub const fn new(default_max_tokens: u32) -> Self {
        Self { default_max_tokens }
    }
}

#[async_trait]
impl Stage for TranslateStage {
    fn name(&self) -> &'static str {
        "translate"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<(), LlmError> {
        let RequestBody::ChatCompletion(request) = &ctx.body else {
            return Ok(());
        };

        let translated = convert::to_messages_request(request.clone(), self.default_max_tokens)?;
        ctx.body = RequestBody::Messages(translated);

        Ok(())
    }
}
