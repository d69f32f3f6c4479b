use parley_core::RequestContext;

use super::PipelineResponse;
use crate::error::LlmError;
use crate::protocol::messages::MessagesApiRequest;
use crate::protocol::openai::OpenAiRequest;
use crate::upstream::UpstreamReply;

/// State carried through one pipeline run
///
/// Built fresh for every attempt, so no stage ever sees leftovers from a
/// failed try.
#[derive(Debug)]
pub struct PipelineContext {
    /// Inbound request metadata
    pub request: RequestContext,
    /// Request body, in whatever shape the current stage left it
    pub body: RequestBody,
    /// Envelope the client expects back
    pub format: ResponseFormat,
    /// Raw upstream reply, set by dispatch
    pub upstream: Option<UpstreamReply>,
    /// Client-facing response, set by the response stage
    pub response: Option<PipelineResponse>,
}

/// Request body variants
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Messages API request, ready to dispatch
    Messages(MessagesApiRequest),
    /// `OpenAI` chat request awaiting translation
    ChatCompletion(OpenAiRequest),
}

/// Response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Messages API shape, passed through
    Anthropic,
    /// `OpenAI` chat completion shape
    OpenAi {
        /// Append a usage chunk to streams
        include_usage: bool,
    },
}

impl PipelineContext {
    pub const fn for_messages(request: RequestContext, body: MessagesApiRequest) -> Self {
        Self {
            request,
            body: RequestBody::Messages(body),
            format: ResponseFormat::Anthropic,
            upstream: None,
            response: None,
        }
    }

    pub fn for_chat_completion(request: RequestContext, body: OpenAiRequest) -> Self {
        let include_usage = body
            .stream_options
            .as_ref()
            .is_some_and(|options| options.include_usage);

        Self {
            request,
            body: RequestBody::ChatCompletion(body),
            format: ResponseFormat::OpenAi { include_usage },
            upstream: None,
            response: None,
        }
    }

    /// The Messages API request
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Internal` when called before translation.
    pub fn messages_request(&self) -> Result<&MessagesApiRequest, LlmError> {
        match &self.body {
            RequestBody::Messages(request) => Ok(request),
            RequestBody::ChatCompletion(_) => {
                Err(anyhow::anyhow!("request has not been translated").into())
            }
        }
    }
}
