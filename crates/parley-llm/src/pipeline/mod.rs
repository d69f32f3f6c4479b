//! Request pipeline
//!
//! Every endpoint runs a fixed sequence of stages over a
//! [`PipelineContext`]. The first failing stage ends the run.
//!
//! - `/v1/messages`: normalize, validate, dispatch, respond
//! - `/v1/chat/completions`: translate, validate, dispatch, respond

mod context;
mod response;
pub mod stages;

use std::sync::Arc;

use async_trait::async_trait;

pub use context::{PipelineContext, RequestBody, ResponseFormat};
pub use response::{ChunkStream, PipelineResponse};
use stages::{DispatchStage, NormalizeStage, ResponseStage, TranslateStage, ValidateStage};

use crate::error::LlmError;
use crate::upstream::Upstream;

/// One step of a pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name for logging
    fn name(&self) -> &'static str;

    /// Run this stage, mutating the context
    async fn execute(&self, ctx: &mut PipelineContext) -> Result<(), LlmError>;
}

/// Ordered list of stages
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<Vec<Box<dyn Stage>>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self {
            stages: Arc::new(stages),
        }
    }

    /// Pipeline behind `/v1/messages`
    pub fn messages(upstream: Arc<dyn Upstream>) -> Self {
        Self::new(vec![
            Box::new(NormalizeStage),
            Box::new(ValidateStage),
            Box::new(DispatchStage::new(upstream)),
            Box::new(ResponseStage),
        ])
    }

    /// Pipeline behind `/v1/chat/completions`
    pub fn chat_completions(upstream: Arc<dyn Upstream>, default_max_tokens: u32) -> Self {
        Self::new(vec![
            Box::new(TranslateStage::new(default_max_tokens)),
            Box::new(ValidateStage),
            Box::new(DispatchStage::new(upstream)),
            Box::new(ResponseStage),
        ])
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run every stage in order
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that fails; later stages do not run.
    pub async fn execute(&self, mut ctx: PipelineContext) -> Result<PipelineContext, LlmError> {
        for stage in self.stages.iter() {
            tracing::debug!(stage = stage.name(), "running pipeline stage");

            if let Err(e) = stage.execute(&mut ctx).await {
                tracing::debug!(stage = stage.name(), error = %e, "pipeline stage failed");
                return Err(e);
            }
        }

        Ok(ctx)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("stages", &self.stage_names()).finish()
    }
}
