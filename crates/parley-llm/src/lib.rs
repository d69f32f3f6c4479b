//! Messages API proxy core
//!
//! Accepts Anthropic Messages and `OpenAI` chat completion requests, runs
//! them through a stage pipeline under a retry policy, and answers in the
//! client's own format, buffered or streamed.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod convert;
pub mod error;
#[cfg(feature = "http")]
pub mod handler;
pub mod models;
pub mod pipeline;
pub mod protocol;
pub mod retry;
pub mod sse;
pub mod state;
pub mod upstream;

pub use error::LlmError;
#[cfg(feature = "http")]
pub use handler::{ErrorFormat, error_response, llm_router};
pub use models::{Model, ModelList, ModelRegistry};
pub use pipeline::{Pipeline, PipelineContext, PipelineResponse, Stage};
pub use retry::{RetryPolicy, RetryState, log_before_sleep};
pub use state::LlmState;
pub use upstream::{AnthropicUpstream, Upstream, UpstreamReply};
