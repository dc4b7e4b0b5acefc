// SPDX-License-Identifier: MIT OR Apache-2.0
//! Responses streaming events and their mapping to chat updates.

use agentkit_core::{AIContent, ChatResponseUpdate, ChatRole, SseEvent};
use agentkit_error::{AgentkitError, ErrorCode, Result};
use serde::Deserialize;

use crate::dialect::{OutputItem, ResponsesResponse};
use crate::lowering::{
    failed_response_error, finish_reason, next_conversation_id, output_contents, usage_details,
};

/// Streaming event, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseStreamEvent {
    /// The response was accepted.
    #[serde(rename = "response.created")]
    Created {
        /// Response snapshot.
        response: ResponsesResponse,
    },
    /// A text fragment.
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        /// Output item the fragment belongs to.
        #[serde(default)]
        item_id: Option<String>,
        /// The fragment.
        delta: String,
    },
    /// An output item is complete.
    #[serde(rename = "response.output_item.done")]
    OutputItemDone {
        /// The finished item.
        item: OutputItem,
    },
    /// The response finished normally.
    #[serde(rename = "response.completed")]
    Completed {
        /// Final response.
        response: ResponsesResponse,
    },
    /// The response stopped early.
    #[serde(rename = "response.incomplete")]
    Incomplete {
        /// Final response.
        response: ResponsesResponse,
    },
    /// The response failed.
    #[serde(rename = "response.failed")]
    Failed {
        /// Final response.
        response: ResponsesResponse,
    },
    /// Stream-level error.
    #[serde(rename = "error")]
    Error {
        /// Vendor error code.
        #[serde(default)]
        code: Option<String>,
        /// Message.
        #[serde(default)]
        message: String,
    },
    /// Events this crate does not map.
    #[serde(other)]
    Other,
}

/// Stateful mapper from stream events to [`ChatResponseUpdate`]s.
#[derive(Debug, Default)]
pub struct StreamMapper {
    stored: bool,
    saw_calls: bool,
    response_id: Option<String>,
    model_id: Option<String>,
}

impl StreamMapper {
    /// Mapper for a request whose response is (or is not) stored.
    pub fn new(stored: bool) -> Self {
        Self {
            stored,
            ..Self::default()
        }
    }

    /// Parse and map one SSE frame.
    pub fn map_sse(&mut self, event: &SseEvent) -> Result<Option<ChatResponseUpdate>> {
        if event.data == "[DONE]" {
            return Ok(None);
        }
        let parsed: ResponseStreamEvent = serde_json::from_str(&event.data).map_err(|e| {
            AgentkitError::new(
                ErrorCode::VendorResponseInvalid,
                format!("invalid stream event: {e}"),
            )
            .with_source(e)
        })?;
        self.map(parsed)
    }

    /// Map one event; `Ok(None)` for events that carry nothing to surface.
    pub fn map(&mut self, event: ResponseStreamEvent) -> Result<Option<ChatResponseUpdate>> {
        match event {
            ResponseStreamEvent::Created { response } => {
                self.response_id = Some(response.id.clone());
                self.model_id = response.model.clone();
                Ok(None)
            }
            ResponseStreamEvent::OutputTextDelta { item_id, delta } => {
                let mut update = self.update();
                update.contents.push(AIContent::text(delta));
                update.message_id = item_id;
                Ok(Some(update))
            }
            ResponseStreamEvent::OutputItemDone {
                item: item @ OutputItem::FunctionCall { .. },
            } => {
                self.saw_calls = true;
                let Some((id, contents)) = output_contents(&item) else {
                    return Ok(None);
                };
                let mut update = self.update();
                update.message_id = id;
                update.contents = contents;
                Ok(Some(update))
            }
            ResponseStreamEvent::OutputItemDone { .. } | ResponseStreamEvent::Other => Ok(None),
            ResponseStreamEvent::Completed { response }
            | ResponseStreamEvent::Incomplete { response } => Ok(Some(self.finish(&response))),
            ResponseStreamEvent::Failed { response } => Err(failed_response_error(&response)),
            ResponseStreamEvent::Error { code, message } => {
                let mut err = AgentkitError::new(ErrorCode::VendorResponseInvalid, message);
                if let Some(code) = code {
                    err = err.with_context("vendor_code", code);
                }
                Err(err)
            }
        }
    }

    fn update(&self) -> ChatResponseUpdate {
        ChatResponseUpdate {
            role: Some(ChatRole::Assistant),
            response_id: self.response_id.clone(),
            model_id: self.model_id.clone(),
            ..ChatResponseUpdate::default()
        }
    }

    fn finish(&mut self, response: &ResponsesResponse) -> ChatResponseUpdate {
        ChatResponseUpdate {
            role: Some(ChatRole::Assistant),
            response_id: Some(response.id.clone()),
            conversation_id: next_conversation_id(response, self.stored),
            model_id: response.model.clone().or_else(|| self.model_id.clone()),
            usage: response.usage.as_ref().map(usage_details),
            finish_reason: finish_reason(
                response.status.as_deref(),
                response
                    .incomplete_details
                    .as_ref()
                    .and_then(|d| d.reason.as_deref()),
                self.saw_calls,
            ),
            ..ChatResponseUpdate::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_core::{ChatResponse, FinishReason};
    use serde_json::json;

    fn frame(v: serde_json::Value) -> SseEvent {
        SseEvent {
            event: v["type"].as_str().map(str::to_owned),
            data: v.to_string(),
        }
    }

    #[test]
    fn text_deltas_coalesce_into_one_message() {
        let mut mapper = StreamMapper::new(true);
        let frames = [
            json!({"type": "response.created", "response": {"id": "resp_1", "model": "gpt-4o"}}),
            json!({"type": "response.output_text.delta", "item_id": "msg_1", "delta": "Arr, "}),
            json!({"type": "response.output_text.delta", "item_id": "msg_1", "delta": "matey"}),
            json!({"type": "response.output_text.done", "item_id": "msg_1", "text": "Arr, matey"}),
            json!({"type": "response.completed", "response": {
                "id": "resp_1", "status": "completed",
                "usage": {"input_tokens": 1, "output_tokens": 2, "total_tokens": 3}
            }}),
        ];
        let updates: Vec<_> = frames
            .into_iter()
            .filter_map(|f| mapper.map_sse(&frame(f)).unwrap())
            .collect();
        assert_eq!(updates.len(), 3);
        let resp = ChatResponse::from_updates(updates);
        assert_eq!(resp.text(), "Arr, matey");
        assert_eq!(resp.messages.len(), 1);
        assert_eq!(resp.conversation_id.as_deref(), Some("resp_1"));
        assert_eq!(resp.model_id.as_deref(), Some("gpt-4o"));
        assert_eq!(resp.finish_reason, Some(FinishReason::Stop));
        assert_eq!(resp.usage.unwrap().total_tokens, 3);
    }

    #[test]
    fn function_call_items_surface_on_done() {
        let mut mapper = StreamMapper::new(false);
        let call = mapper
            .map_sse(&frame(json!({
                "type": "response.output_item.done",
                "item": {"type": "function_call", "id": "fc_1", "call_id": "c1", "name": "f", "arguments": "{}"}
            })))
            .unwrap()
            .unwrap();
        assert!(matches!(
            call.contents[0],
            AIContent::FunctionCall { ref name, .. } if name == "f"
        ));
        let completed = json!({
            "type": "response.completed",
            "response": {"id": "resp_2", "status": "completed"}
        });
        let last = mapper
            .map_sse(&frame(completed))
            .unwrap()
            .unwrap();
        assert_eq!(last.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(last.conversation_id, None);
    }

    #[test]
    fn failures_become_errors() {
        let mut mapper = StreamMapper::new(true);
        let err = mapper
            .map_sse(&frame(json!({"type": "error", "code": "rate_limit", "message": "slow down"})))
            .unwrap_err();
        assert_eq!(err.message, "slow down");
        let failed = json!({
            "type": "response.failed",
            "response": {"id": "r", "status": "failed", "error": {"message": "bad"}}
        });
        let err = mapper.map_sse(&frame(failed)).unwrap_err();
        assert_eq!(err.message, "bad");
    }

    #[test]
    fn done_marker_and_garbage() {
        let mut mapper = StreamMapper::new(true);
        let done = SseEvent {
            event: None,
            data: "[DONE]".into(),
        };
        assert!(mapper.map_sse(&done).unwrap().is_none());
        let garbage = SseEvent {
            event: None,
            data: "{oops".into(),
        };
        assert_eq!(
            mapper.map_sse(&garbage).unwrap_err().code,
            ErrorCode::VendorResponseInvalid
        );
    }
}
