// SPDX-License-Identifier: MIT OR Apache-2.0
//! Mapping of Messages API stream events to chat updates.

use std::collections::BTreeMap;

use agentkit_core::{AIContent, ChatResponseUpdate, ChatRole, SseEvent, UsageDetails};
use agentkit_error::{AgentkitError, ErrorCode, Result};
use serde_json::{Value, json};

use crate::dialect::{ClaudeStreamDelta, ClaudeStreamEvent, ContentBlock};
use crate::lowering::finish_reason;

#[derive(Debug)]
struct PendingToolUse {
    id: String,
    name: String,
    json: String,
}

/// Stateful mapper; tool-use input is accumulated per block index.
#[derive(Debug, Default)]
pub struct ClaudeStreamMapper {
    message_id: Option<String>,
    model_id: Option<String>,
    input_tokens: u64,
    tool_uses: BTreeMap<u32, PendingToolUse>,
}

impl ClaudeStreamMapper {
    /// Fresh mapper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and map one SSE frame.
    pub fn map_sse(&mut self, event: &SseEvent) -> Result<Option<ChatResponseUpdate>> {
        let parsed: ClaudeStreamEvent = serde_json::from_str(&event.data).map_err(|e| {
            AgentkitError::new(
                ErrorCode::VendorResponseInvalid,
                format!("invalid stream event: {e}"),
            )
            .with_source(e)
        })?;
        self.map(parsed)
    }

    /// Map one event; `Ok(None)` for events that carry nothing to surface.
    pub fn map(&mut self, event: ClaudeStreamEvent) -> Result<Option<ChatResponseUpdate>> {
        match event {
            ClaudeStreamEvent::MessageStart { message } => {
                self.message_id = Some(message.id);
                self.model_id = message.model;
                self.input_tokens = message.usage.map(|u| u.input_tokens).unwrap_or(0);
                Ok(None)
            }
            ClaudeStreamEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                ContentBlock::ToolUse { id, name, .. } => {
                    self.tool_uses.insert(
                        index,
                        PendingToolUse {
                            id,
                            name,
                            json: String::new(),
                        },
                    );
                    Ok(None)
                }
                ContentBlock::Text { text } if !text.is_empty() => Ok(Some(self.text(text))),
                _ => Ok(None),
            },
            ClaudeStreamEvent::ContentBlockDelta { index, delta } => match delta {
                ClaudeStreamDelta::TextDelta { text } => Ok(Some(self.text(text))),
                ClaudeStreamDelta::InputJsonDelta { partial_json } => {
                    if let Some(pending) = self.tool_uses.get_mut(&index) {
                        pending.json.push_str(&partial_json);
                    }
                    Ok(None)
                }
                ClaudeStreamDelta::Unknown => Ok(None),
            },
            ClaudeStreamEvent::ContentBlockStop { index } => {
                let Some(pending) = self.tool_uses.remove(&index) else {
                    return Ok(None);
                };
                let arguments = if pending.json.trim().is_empty() {
                    json!({})
                } else {
                    serde_json::from_str(&pending.json).unwrap_or(Value::String(pending.json))
                };
                let mut update = self.update();
                update.contents.push(AIContent::FunctionCall {
                    call_id: pending.id,
                    name: pending.name,
                    arguments,
                });
                Ok(Some(update))
            }
            ClaudeStreamEvent::MessageDelta { delta, usage } => {
                let mut update = self.update();
                update.response_id = self.message_id.clone();
                update.finish_reason = finish_reason(delta.stop_reason.as_deref());
                update.usage = usage.map(|u| {
                    let input = self.input_tokens.max(u.input_tokens);
                    UsageDetails {
                        input_tokens: input,
                        output_tokens: u.output_tokens,
                        total_tokens: input + u.output_tokens,
                    }
                });
                Ok(Some(update))
            }
            ClaudeStreamEvent::MessageStop
            | ClaudeStreamEvent::Ping
            | ClaudeStreamEvent::Unknown => Ok(None),
            ClaudeStreamEvent::Error { error } => Err(AgentkitError::new(
                ErrorCode::VendorResponseInvalid,
                error.message,
            )
            .with_context("vendor_code", error.error_type)),
        }
    }

    fn update(&self) -> ChatResponseUpdate {
        ChatResponseUpdate {
            role: Some(ChatRole::Assistant),
            message_id: self.message_id.clone(),
            model_id: self.model_id.clone(),
            ..ChatResponseUpdate::default()
        }
    }

    fn text(&self, text: String) -> ChatResponseUpdate {
        let mut update = self.update();
        update.contents.push(AIContent::text(text));
        update
    }
}
