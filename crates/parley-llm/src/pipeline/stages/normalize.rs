use async_trait::async_trait;

use crate::error::LlmError;
use crate::pipeline::{PipelineContext, RequestBody, Stage};
use crate::protocol::messages::MessagesApiRequest;

/// Temperature the upstream requires while extended thinking is on
pub const THINKING_TEMPERATURE: f64 = 1.0;

/// Adjusts Messages API requests before validation
pub struct NormalizeStage;

#[async_trait]
impl Stage for NormalizeStage {
    fn name(&self) -> &'static str {
        "normalize"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<(), LlmError> {
        if let RequestBody::Messages(request) = &ctx.body {
            let normalized = normalize_request(request);

            if normalized.temperature != request.temperature {
                tracing::debug!(
                    requested = ?request.temperature,
                    "thinking enabled, forcing temperature to {THINKING_TEMPERATURE}"
                );
            }

            ctx.body = RequestBody::Messages(normalized);
        }

        Ok(())
    }
}

/// Return a normalized copy of `request`
///
/// With thinking enabled the temperature is forced to 1 whatever the client
/// sent. Nothing else changes.
pub fn normalize_request(request: &MessagesApiRequest) -> MessagesApiRequest {
    let mut normalized = request.clone();

    if request.thinking_enabled() {
        normalized.temperature = Some(THINKING_TEMPERATURE);
    }

    normalized
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn request(extra: Value) -> MessagesApiRequest {
        let mut body = json!({
            "model": "claude-sonnet-4-20250514",
            "max_tokens": 4096,
            "messages": [{"role": "user", "content": "hi"}]
        });
        body.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn thinking_forces_temperature_to_one() {
        let original = request(json!({
            "temperature": 0.2,
            "thinking": {"type": "enabled", "budget_tokens": 2048}
        }));
        let normalized = normalize_request(&original);

        assert_eq!(normalized.temperature, Some(1.0));
        assert_eq!(original.temperature, Some(0.2));
    }

    #[test]
    fn thinking_sets_temperature_when_absent() {
        let thinking = json!({"thinking": {"type": "enabled", "budget_tokens": 2048}});
        let normalized = normalize_request(&request(thinking));
        assert_eq!(normalized.temperature, Some(1.0));
    }

    #[test]
    fn disabled_thinking_leaves_request_alone() {
        let original = request(json!({"temperature": 0.3, "thinking": {"type": "disabled"}}));
        assert_eq!(normalize_request(&original), original);
    }

    #[test]
    fn request_without_thinking_is_unchanged() {
        let original = request(json!({"temperature": 0.7, "top_k": 5}));
        assert_eq!(normalize_request(&original), original);
    }
}
