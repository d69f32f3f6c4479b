//! Axum route handlers for the Messages, chat completions and models endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json, Router, routing};
use parley_core::{HttpError, RequestContext};
use tracing::Instrument;

use crate::error::LlmError;
use crate::protocol::messages::{ErrorEnvelope, MessagesApiRequest};
use crate::protocol::openai::{OpenAiErrorResponse, OpenAiRequest};
use crate::state::LlmState;

/// Error envelope a client expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFormat {
    /// `{"type": "error", "error": {...}}`
    Anthropic,
    /// `{"error": {...}}`
    OpenAi,
}

impl ErrorFormat {
    /// Envelope used by the endpoint at `path`
    pub fn for_path(path: &str) -> Self {
        if path.ends_with("/chat/completions") || path.contains("/models") {
            Self::OpenAi
        } else {
            Self::Anthropic
        }
    }
}

/// Build the LLM router with all endpoints
pub fn llm_router(state: LlmState) -> Router {
    Router::new()
        .route("/v1/messages", routing::post(create_message))
        .route("/v1/chat/completions", routing::post(create_chat_completion))
        .route("/v1/models", routing::get(list_models))
        .route("/v1/models/{model_id}", routing::get(get_model))
        .with_state(state)
}

/// Handle `POST /v1/messages`
async fn create_message(
    State(state): State<LlmState>,
    Extension(context): Extension<RequestContext>,
    body: Result<Json<MessagesApiRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return rejected(&rejection, ErrorFormat::Anthropic),
    };

    let span = request_span(&context, "messages", &request.model, request.is_stream());

    match state.create_message(context, request).instrument(span).await {
        Ok(response) => response.into_response(),
        Err(e) => error_response(&e, ErrorFormat::Anthropic),
    }
}

/// Handle `POST /v1/chat/completions`
async fn create_chat_completion(
    State(state): State<LlmState>,
    Extension(context): Extension<RequestContext>,
    body: Result<Json<OpenAiRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return rejected(&rejection, ErrorFormat::OpenAi),
    };

    let stream = request.stream.unwrap_or(false);
    let span = request_span(&context, "chat_completions", &request.model, stream);

    match state.create_chat_completion(context, request).instrument(span).await {
        Ok(response) => response.into_response(),
        Err(e) => error_response(&e, ErrorFormat::OpenAi),
    }
}

/// Handle `GET /v1/models`
async fn list_models(State(state): State<LlmState>) -> Response {
    Json(state.models().list_models()).into_response()
}

/// Handle `GET /v1/models/{model_id}`
async fn get_model(State(state): State<LlmState>, Path(model_id): Path<String>) -> Response {
    match state.models().get_model(&model_id) {
        Some(model) => Json(model).into_response(),
        None => error_response(&LlmError::ModelNotFound { model: model_id }, ErrorFormat::OpenAi),
    }
}

fn request_span(
    context: &RequestContext,
    endpoint: &'static str,
    model: &str,
    stream: bool,
) -> tracing::Span {
    tracing::info_span!(
        "llm_request",
        request_id = %uuid::Uuid::new_v4(),
        path = %context.path(),
        endpoint,
        model = %model,
        stream,
    )
}

fn rejected(rejection: &JsonRejection, format: ErrorFormat) -> Response {
    error_response(&LlmError::InvalidRequest(rejection.body_text()), format)
}

/// Render an error in the envelope of `format`
pub fn error_response(error: &LlmError, format: ErrorFormat) -> Response {
    let status = error.status_code();

    if error.is_client_fault() {
        tracing::debug!(status = %status, error = %error, "request rejected");
    } else {
        tracing::warn!(status = %status, error = %error, "request failed");
    }

    match format {
        ErrorFormat::Anthropic => {
            let body = ErrorEnvelope::new(error.error_type(), error.client_message());
            (status, Json(body)).into_response()
        }
        ErrorFormat::OpenAi => {
            let body = OpenAiErrorResponse::new(error.error_type(), error.client_message());
            (status, Json(body)).into_response()
        }
    }
}
