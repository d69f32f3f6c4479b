//! Mock Anthropic Messages API for integration tests

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Reply text used by every successful response
pub const REPLY_TEXT: &str = "Hello from mock";

/// How the mock answers
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    /// Answer the first `n` requests with 529 `overloaded_error`
    pub fail_first: u32,
    /// Answer every request with this status and error type
    pub error: Option<(u16, &'static str)>,
    /// Wait this long before answering
    pub delay: Option<Duration>,
    /// Answer 200 with an empty body
    pub empty_body: bool,
    /// Answer with a `tool_use` block instead of text
    pub tool_call: bool,
    /// Wait this long before each streamed event
    pub event_interval: Option<Duration>,
    /// Stream `message_start`, then send nothing more
    pub stall_stream: bool,
}

struct MockState {
    behavior: MockBehavior,
    request_count: AtomicU32,
    answered_count: AtomicU32,
    aborted_streams: AtomicU32,
    remaining_failures: AtomicU32,
    last_body: Mutex<Option<Value>>,
    last_headers: Mutex<Option<HeaderMap>>,
}

/// A running mock upstream
pub struct MockUpstream {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown: CancellationToken,
}

impl MockUpstream {
    /// Start a mock that answers every request successfully
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(MockBehavior::default()).await
    }

    /// Start a mock with the given behavior
    pub async fn start_with(behavior: MockBehavior) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            remaining_failures: AtomicU32::new(behavior.fail_first),
            behavior,
            request_count: AtomicU32::new(0),
            answered_count: AtomicU32::new(0),
            aborted_streams: AtomicU32::new(0),
            last_body: Mutex::new(None),
            last_headers: Mutex::new(None),
        });

        let app = axum::Router::new()
            .route("/v1/messages", post(messages))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await
                .ok();
        });

        Ok(Self { addr, state, shutdown })
    }

    /// Base URL to configure as the upstream
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Requests received so far
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::SeqCst)
    }

    /// Requests that got past `delay` and were answered
    pub fn answered_count(&self) -> u32 {
        self.state.answered_count.load(Ordering::SeqCst)
    }

    /// Streams dropped before their last event was sent
    pub fn aborted_streams(&self) -> u32 {
        self.state.aborted_streams.load(Ordering::SeqCst)
    }

    /// Body of the most recent request
    pub fn last_body(&self) -> Option<Value> {
        self.state.last_body.lock().unwrap().clone()
    }

    /// Headers of the most recent request
    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.state.last_headers.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn messages(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.request_count.fetch_add(1, Ordering::SeqCst);
    *state.last_headers.lock().unwrap() = Some(headers);
    *state.last_body.lock().unwrap() = Some(body.clone());

    let behavior = &state.behavior;

    if let Some(delay) = behavior.delay {
        tokio::time::sleep(delay).await;
    }

    state.answered_count.fetch_add(1, Ordering::SeqCst);

    let failed = state
        .remaining_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();

    if failed {
        return error(StatusCode::from_u16(529).unwrap(), "overloaded_error", "Overloaded");
    }

    if let Some((status, kind)) = behavior.error {
        return error(StatusCode::from_u16(status).unwrap(), kind, "mock failure");
    }

    if behavior.empty_body {
        return StatusCode::OK.into_response();
    }

    let model = body["model"].as_str().unwrap_or("claude-mock").to_owned();

    if body["stream"].as_bool().unwrap_or(false) {
        stream_reply(&state, &model).into_response()
    } else {
        Json(buffered_reply(&model, behavior.tool_call)).into_response()
    }
}

fn error(status: StatusCode, kind: &str, message: &str) -> Response {
    let body = json!({
        "type": "error",
        "error": { "type": kind, "message": message }
    });

    (status, Json(body)).into_response()
}

fn buffered_reply(model: &str, tool_call: bool) -> Value {
    let (content, stop_reason) = if tool_call {
        (
            json!([{
                "type": "tool_use",
                "id": "toolu_mock",
                "name": "get_weather",
                "input": { "city": "Paris" }
            }]),
            "tool_use",
        )
    } else {
        (json!([{ "type": "text", "text": REPLY_TEXT }]), "end_turn")
    };

    json!({
        "id": "msg_mock",
        "type": "message",
        "role": "assistant",
        "model": model,
        "content": content,
        "stop_reason": stop_reason,
        "stop_sequence": null,
        "usage": { "input_tokens": 12, "output_tokens": 5 }
    })
}

fn stream_reply(state: &Arc<MockState>, model: &str) -> impl IntoResponse {
    let tool_call = state.behavior.tool_call;

    let mut events = vec![(
        "message_start",
        json!({
            "type": "message_start",
            "message": {
                "id": "msg_mock",
                "type": "message",
                "role": "assistant",
                "model": model,
                "content": [],
                "stop_reason": null,
                "stop_sequence": null,
                "usage": { "input_tokens": 12, "output_tokens": 1 }
            }
        }),
    )];

    if tool_call {
        events.push((
            "content_block_start",
            json!({
                "type": "content_block_start",
                "index": 0,
                "content_block": {
                    "type": "tool_use",
                    "id": "toolu_mock",
                    "name": "get_weather",
                    "input": {}
                }
            }),
        ));
        for part in ["{\"city\":", "\"Paris\"}"] {
            events.push((
                "content_block_delta",
                json!({
                    "type": "content_block_delta",
                    "index": 0,
                    "delta": { "type": "input_json_delta", "partial_json": part }
                }),
            ));
        }
    } else {
        events.push((
            "content_block_start",
            json!({
                "type": "content_block_start",
                "index": 0,
                "content_block": { "type": "text", "text": "" }
            }),
        ));
        for word in ["Hello", " from", " mock"] {
            events.push((
                "content_block_delta",
                json!({
                    "type": "content_block_delta",
                    "index": 0,
                    "delta": { "type": "text_delta", "text": word }
                }),
            ));
        }
    }

    let stop_reason = if tool_call { "tool_use" } else { "end_turn" };

    events.push(("content_block_stop", json!({ "type": "content_block_stop", "index": 0 })));
    events.push((
        "message_delta",
        json!({
            "type": "message_delta",
            "delta": { "stop_reason": stop_reason, "stop_sequence": null },
            "usage": { "output_tokens": 5 }
        }),
    ));
    events.push(("message_stop", json!({ "type": "message_stop" })));

    let reply = ReplyStream {
        events: events.into_iter(),
        sent: 0,
        finished: false,
        state: state.clone(),
    };

    Sse::new(futures_util::stream::unfold(reply, next_event))
}

/// Streamed reply; counts itself aborted when dropped before the last event
struct ReplyStream {
    events: std::vec::IntoIter<(&'static str, Value)>,
    sent: usize,
    finished: bool,
    state: Arc<MockState>,
}

impl Drop for ReplyStream {
    fn drop(&mut self) {
        if !self.finished {
            self.state.aborted_streams.fetch_add(1, Ordering::SeqCst);
        }
    }
}

async fn next_event(mut reply: ReplyStream) -> Option<(Result<Event, Infallible>, ReplyStream)> {
    let behavior = &reply.state.behavior;

    if behavior.stall_stream && reply.sent > 0 {
        std::future::pending::<()>().await;
    }
    if let Some(interval) = behavior.event_interval {
        tokio::time::sleep(interval).await;
    }

    let (name, data) = reply.events.next()?;
    reply.sent += 1;
    reply.finished = reply.events.as_slice().is_empty();

    let event = Event::default().event(name).data(data.to_string());
    Some((Ok(event), reply))
}
