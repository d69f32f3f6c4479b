//! Shared state behind the LLM route handlers

use std::sync::Arc;

use parley_config::Config;
use parley_core::RequestContext;

use crate::error::LlmError;
use crate::models::ModelRegistry;
use crate::pipeline::{Pipeline, PipelineContext, PipelineResponse};
use crate::protocol::messages::MessagesApiRequest;
use crate::protocol::openai::OpenAiRequest;
use crate::retry::{RetryPolicy, log_before_sleep};
use crate::upstream::{AnthropicUpstream, Upstream};

/// Shared state for LLM route handlers
#[derive(Clone)]
pub struct LlmState {
    pub(crate) inner: Arc<LlmStateInner>,
}

pub(crate) struct LlmStateInner {
    pub(crate) messages: Pipeline,
    pub(crate) chat_completions: Pipeline,
    pub(crate) retry: RetryPolicy,
    pub(crate) models: ModelRegistry,
}

impl LlmState {
    /// Build state talking to the configured upstream
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let upstream: Arc<dyn Upstream> = Arc::new(AnthropicUpstream::new(&config.upstream)?);

        Ok(Self::new(
            upstream,
            config.upstream.default_max_tokens,
            RetryPolicy::from_config(&config.retry),
            ModelRegistry::builtin(),
        ))
    }

    /// Build state around any upstream
    pub fn new(
        upstream: Arc<dyn Upstream>,
        default_max_tokens: u32,
        retry: RetryPolicy,
        models: ModelRegistry,
    ) -> Self {
        Self {
            inner: Arc::new(LlmStateInner {
                messages: Pipeline::messages(upstream.clone()),
                chat_completions: Pipeline::chat_completions(upstream, default_max_tokens),
                retry,
                models,
            }),
        }
    }

    /// Model catalogue
    pub fn models(&self) -> &ModelRegistry {
        &self.inner.models
    }

    /// Run a Messages API request
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt
    pub async fn create_message(
        &self,
        context: RequestContext,
        request: MessagesApiRequest,
    ) -> Result<PipelineResponse, LlmError> {
        self.execute(&self.inner.messages, || {
            PipelineContext::for_messages(context.clone(), request.clone())
        })
        .await
    }

    /// Run an `OpenAI` chat completion request
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt
    pub async fn create_chat_completion(
        &self,
        context: RequestContext,
        request: OpenAiRequest,
    ) -> Result<PipelineResponse, LlmError> {
        self.execute(&self.inner.chat_completions, || {
            PipelineContext::for_chat_completion(context.clone(), request.clone())
        })
        .await
    }

    /// Run `pipeline` under the retry policy
    ///
    /// Each attempt starts from a fresh context. A run that completes
    /// without a response is `LlmError::NoResponse`.
    async fn execute<F>(&self, pipeline: &Pipeline, build: F) -> Result<PipelineResponse, LlmError>
    where
        F: Fn() -> PipelineContext,
    {
        let attempt = || {
            let ctx = build();
            async move {
                let ctx = pipeline.execute(ctx).await?;
                ctx.response.ok_or(LlmError::NoResponse)
            }
        };

        self.inner
            .retry
            .run(attempt, LlmError::is_retryable, log_before_sleep::<LlmError>)
            .await
    }
}
