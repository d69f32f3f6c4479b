use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::pipeline::{PipelineContext, Stage};
use crate::upstream::Upstream;

/// Sends the request upstream and stores the reply
pub struct DispatchStage {
    upstream: Arc<dyn Upstream>,
}

impl DispatchStage {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl Stage for DispatchStage {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<(), LlmError> {
        // The context is not Sync, so no borrow of it may live across the await
        let request = ctx.messages_request()?.clone();
        let context = ctx.request.clone();
        let reply = self.upstream.send(&request, &context).await?;

        if reply.is_none() {
            tracing::warn!(model = %request.model, "upstream returned an empty body");
        }

        ctx.upstream = reply;
        Ok(())
    }
}
