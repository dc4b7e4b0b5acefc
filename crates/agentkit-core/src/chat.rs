// SPDX-License-Identifier: MIT OR Apache-2.0
//! The chat-client seam every vendor transport implements.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;

use agentkit_error::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cancel::CancelToken;
use crate::message::{AIContent, ChatMessage, ChatRole, UsageDetails};
use crate::tool::AITool;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How the model may pick tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    /// Model decides.
    Auto,
    /// No tool calls.
    None,
    /// At least one tool call.
    RequireAny,
    /// Call the named function.
    RequireSpecific(String),
}

/// Per-request options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    /// Service-side conversation or previous-response id.
    pub conversation_id: Option<String>,
    /// Extra system instructions.
    pub instructions: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Nucleus sampling.
    pub top_p: Option<f32>,
    /// Output token cap.
    pub max_output_tokens: Option<u32>,
    /// Model or deployment name.
    pub model_id: Option<String>,
    /// Tools offered to the model.
    pub tools: Vec<AITool>,
    /// Tool choice.
    pub tool_mode: Option<ToolMode>,
    /// Raw members merged into the vendor request body.
    pub additional_properties: BTreeMap<String, Value>,
}

impl ChatOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the conversation id.
    #[must_use]
    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    /// Set the instructions.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Set the model id.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_id = Some(model.into());
        self
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output token cap.
    #[must_use]
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    /// Append a tool.
    #[must_use]
    pub fn with_tool(mut self, tool: AITool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Replace the tool list.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<AITool>) -> Self {
        self.tools = tools;
        self
    }

    /// Add a raw request member.
    #[must_use]
    pub fn with_additional_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.additional_properties.insert(key.into(), value);
        self
    }

    /// Look up a tool by name.
    pub fn find_tool(&self, name: &str) -> Option<&AITool> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Fill unset fields from `defaults`; tools are appended after ours.
    pub fn merged_over(&self, defaults: &ChatOptions) -> ChatOptions {
        let mut out = self.clone();
        out.conversation_id = out
            .conversation_id
            .or_else(|| defaults.conversation_id.clone());
        out.instructions = match (&defaults.instructions, &self.instructions) {
            (Some(a), Some(b)) if a != b => Some(format!("{a}\n{b}")),
            (Some(a), None) => Some(a.clone()),
            (_, other) => other.clone(),
        };
        out.temperature = out.temperature.or(defaults.temperature);
        out.top_p = out.top_p.or(defaults.top_p);
        out.max_output_tokens = out.max_output_tokens.or(defaults.max_output_tokens);
        out.model_id = out.model_id.or_else(|| defaults.model_id.clone());
        out.tool_mode = out.tool_mode.or_else(|| defaults.tool_mode.clone());
        for tool in &defaults.tools {
            if out.find_tool(tool.name()).is_none() {
                out.tools.push(tool.clone());
            }
        }
        for (k, v) in &defaults.additional_properties {
            out.additional_properties
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Why the model stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of turn.
    Stop,
    /// Token limit reached.
    Length,
    /// The model requested tool calls.
    ToolCalls,
    /// Output was filtered.
    ContentFilter,
}

/// A complete (non-streaming) response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    /// Messages produced by the model (and by in-process tool calls).
    pub messages: Vec<ChatMessage>,
    /// Vendor response id.
    pub response_id: Option<String>,
    /// Conversation id to send on the next turn, when the service keeps state.
    pub conversation_id: Option<String>,
    /// Model that answered.
    pub model_id: Option<String>,
    /// Token usage.
    pub usage: Option<UsageDetails>,
    /// Stop reason.
    pub finish_reason: Option<FinishReason>,
}

impl ChatResponse {
    /// Response holding a single message.
    pub fn from_message(message: ChatMessage) -> Self {
        Self {
            messages: vec![message],
            ..Self::default()
        }
    }

    /// Text of all messages, concatenated.
    pub fn text(&self) -> String {
        self.messages.iter().map(ChatMessage::text).collect()
    }

    /// Coalesce streamed fragments into a response.
    ///
    /// Consecutive fragments sharing a message id and role form one message;
    /// adjacent text parts are joined.
    pub fn from_updates(updates: impl IntoIterator<Item = ChatResponseUpdate>) -> Self {
        let mut resp = ChatResponse::default();
        let mut current: Option<ChatMessage> = None;
        for update in updates {
            if update.response_id.is_some() {
                resp.response_id = update.response_id.clone();
            }
            if update.conversation_id.is_some() {
                resp.conversation_id = update.conversation_id.clone();
            }
            if update.model_id.is_some() {
                resp.model_id = update.model_id.clone();
            }
            if let Some(u) = &update.usage {
                resp.usage.get_or_insert_with(UsageDetails::default).add(u);
            }
            if update.finish_reason.is_some() {
                resp.finish_reason = update.finish_reason;
            }
            if update.contents.is_empty() {
                continue;
            }
            if current.as_ref().is_some_and(|m| starts_new_message(m, &update)) {
                resp.messages.extend(current.take());
            }
            let msg = current.get_or_insert_with(|| ChatMessage {
                role: update.role.unwrap_or(ChatRole::Assistant),
                contents: Vec::new(),
                author_name: update.author_name.clone(),
                message_id: update.message_id.clone(),
            });
            if msg.message_id.is_none() {
                msg.message_id = update.message_id.clone();
            }
            for content in update.contents {
                push_content(&mut msg.contents, content);
            }
        }
        resp.messages.extend(current);
        resp
    }

    /// Split into updates, one per message.
    pub fn to_updates(&self) -> Vec<ChatResponseUpdate> {
        let mut out: Vec<ChatResponseUpdate> = self
            .messages
            .iter()
            .map(|m| ChatResponseUpdate {
                role: Some(m.role),
                contents: m.contents.clone(),
                author_name: m.author_name.clone(),
                message_id: m.message_id.clone(),
                response_id: self.response_id.clone(),
                conversation_id: self.conversation_id.clone(),
                model_id: self.model_id.clone(),
                ..ChatResponseUpdate::default()
            })
            .collect();
        if let Some(last) = out.last_mut() {
            last.usage = self.usage;
            last.finish_reason = self.finish_reason;
        }
        out
    }
}

fn starts_new_message(current: &ChatMessage, update: &ChatResponseUpdate) -> bool {
    let id_changed = match (&current.message_id, &update.message_id) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    };
    let role_changed = update.role.is_some_and(|r| r != current.role);
    id_changed || role_changed
}

fn push_content(contents: &mut Vec<AIContent>, content: AIContent) {
    if let (Some(AIContent::Text { text: last }), AIContent::Text { text }) =
        (contents.last_mut(), &content)
    {
        last.push_str(text);
        return;
    }
    contents.push(content);
}

/// One streamed fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponseUpdate {
    /// Author role, when known.
    pub role: Option<ChatRole>,
    /// Content fragments.
    pub contents: Vec<AIContent>,
    /// Author name.
    pub author_name: Option<String>,
    /// Message the fragment belongs to.
    pub message_id: Option<String>,
    /// Vendor response id.
    pub response_id: Option<String>,
    /// Conversation id for the next turn.
    pub conversation_id: Option<String>,
    /// Model that answered.
    pub model_id: Option<String>,
    /// Usage, usually on the final fragment.
    pub usage: Option<UsageDetails>,
    /// Stop reason, usually on the final fragment.
    pub finish_reason: Option<FinishReason>,
}

impl ChatResponseUpdate {
    /// A text fragment from the assistant.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            role: Some(ChatRole::Assistant),
            contents: vec![AIContent::text(text)],
            ..Self::default()
        }
    }

    /// Concatenated text of this fragment.
    pub fn text_content(&self) -> String {
        self.contents
            .iter()
            .filter_map(|c| match c {
                AIContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ChatClient
// ---------------------------------------------------------------------------

/// Describes a chat client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatClientMetadata {
    /// Provider name, e.g. `"openai"`.
    pub provider_name: String,
    /// Base URL of the service.
    pub provider_uri: Option<String>,
    /// Model used when options do not name one.
    pub default_model_id: Option<String>,
}

/// Boxed stream of response fragments.
pub type ChatResponseStream = Pin<Box<dyn Stream<Item = Result<ChatResponseUpdate>> + Send>>;

/// A vendor chat transport or a wrapper around one.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Describe the client.
    fn metadata(&self) -> ChatClientMetadata;

    /// Send `messages` and wait for the complete response.
    async fn get_response(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancelToken,
    ) -> Result<ChatResponse>;

    /// Send `messages` and stream the response.
    async fn get_streaming_response(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancelToken,
    ) -> Result<ChatResponseStream>;
}

#[async_trait]
impl<T: ChatClient + ?Sized> ChatClient for Arc<T> {
    fn metadata(&self) -> ChatClientMetadata {
        (**self).metadata()
    }

    async fn get_response(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancelToken,
    ) -> Result<ChatResponse> {
        (**self).get_response(messages, options, cancel).await
    }

    async fn get_streaming_response(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancelToken,
    ) -> Result<ChatResponseStream> {
        (**self)
            .get_streaming_response(messages, options, cancel)
            .await
    }
}
