// SPDX-License-Identifier: MIT OR Apache-2.0
//! Anthropic Messages dialect: config and wire types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default base URL of the Messages API.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Value of the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// `max_tokens` used when neither options nor config set one.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Server-side web search tool type.
pub const WEB_SEARCH_TOOL_TYPE: &str = "web_search_20250305";

/// Server-side code execution tool type.
pub const CODE_EXECUTION_TOOL_TYPE: &str = "code_execution_20250522";

/// Beta flag required by [`CODE_EXECUTION_TOOL_TYPE`].
pub const BETA_CODE_EXECUTION: &str = "code-execution-2025-05-22";

/// Beta flag required by `mcp_servers`.
pub const BETA_MCP_CLIENT: &str = "mcp-client-2025-04-04";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Endpoint configuration for [`crate::client::AnthropicChatClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudeConfig {
    /// Base URL; `/messages` is appended.
    pub base_url: String,
    /// Model used when the request does not name one.
    pub model: String,
    /// Maximum tokens to generate when the request does not set a cap.
    pub max_tokens: u32,
    /// `anthropic-version` header value.
    pub anthropic_version: String,
    /// Extra headers added to every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            anthropic_version: ANTHROPIC_VERSION.into(),
            headers: BTreeMap::new(),
        }
    }
}

impl ClaudeConfig {
    /// Config for `base_url` with defaults elsewhere.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the default model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the default token cap.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// Entry of the request `tools` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaudeTool {
    /// Client tool with an input schema.
    Custom(CustomTool),
    /// Versioned server tool (`web_search_*`, `code_execution_*`).
    Server(ServerTool),
    /// Any other descriptor, passed through verbatim.
    Other(Value),
}

/// `{name, description, input_schema}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTool {
    /// Tool name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the input.
    pub input_schema: Value,
}

/// A server tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTool {
    /// Versioned type, e.g. `web_search_20250305`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Tool name.
    pub name: String,
    /// Cap on uses per request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u32>,
    /// Location hint for web search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_location: Option<ClaudeUserLocation>,
}

/// `{"type": "approximate", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaudeUserLocation {
    /// Always `"approximate"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Timezone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Entry of the request `mcp_servers` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerDefinition {
    /// Always `"url"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Server URL.
    pub url: String,
    /// Server name.
    pub name: String,
    /// OAuth token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_token: Option<String>,
    /// Tool allow-list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_configuration: Option<McpToolConfiguration>,
}

/// `{enabled, allowed_tools}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpToolConfiguration {
    /// Whether tools are enabled.
    pub enabled: bool,
    /// Allowed tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// `POST /messages` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagesRequest {
    /// Model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// System prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Conversation.
    pub messages: Vec<ClaudeMessage>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Tools.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ClaudeTool>,
    /// Tool choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    /// Remote MCP servers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<McpServerDefinition>,
    /// Stream the response as SSE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Members merged from `ChatOptions::additional_properties`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaudeMessage {
    /// `"user"` or `"assistant"`.
    pub role: String,
    /// Content blocks.
    pub content: Vec<ContentBlock>,
}

/// Content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text.
    Text {
        /// The text.
        text: String,
    },
    /// Client tool call.
    ToolUse {
        /// Call id.
        id: String,
        /// Tool name.
        name: String,
        /// Input object.
        input: Value,
    },
    /// Result of a client tool call.
    ToolResult {
        /// Id of the originating call.
        tool_use_id: String,
        /// Result text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Marks an error result.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    /// Blocks this crate does not model (server tool use, results, thinking).
    #[serde(other)]
    Unknown,
}

/// `POST /messages` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagesResponse {
    /// Message id.
    pub id: String,
    /// Model that answered.
    #[serde(default)]
    pub model: Option<String>,
    /// Always `"assistant"`.
    #[serde(default)]
    pub role: Option<String>,
    /// Content blocks.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// `end_turn`, `max_tokens`, `tool_use`, ...
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// Token usage.
    #[serde(default)]
    pub usage: Option<ClaudeUsage>,
}

/// Token usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaudeUsage {
    /// Prompt tokens.
    #[serde(default)]
    pub input_tokens: u64,
    /// Generated tokens.
    #[serde(default)]
    pub output_tokens: u64,
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

/// Streaming event, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeStreamEvent {
    /// First event; carries id, model and input usage.
    MessageStart {
        /// Message snapshot.
        message: MessagesResponse,
    },
    /// A content block opens.
    ContentBlockStart {
        /// Block index.
        index: u32,
        /// Initial block.
        content_block: ContentBlock,
    },
    /// Incremental block content.
    ContentBlockDelta {
        /// Block index.
        index: u32,
        /// Delta.
        delta: ClaudeStreamDelta,
    },
    /// A content block closes.
    ContentBlockStop {
        /// Block index.
        index: u32,
    },
    /// Top-level message changes.
    MessageDelta {
        /// Stop reason.
        delta: ClaudeMessageDelta,
        /// Cumulative output usage.
        #[serde(default)]
        usage: Option<ClaudeUsage>,
    },
    /// Last event.
    MessageStop,
    /// Keep-alive.
    Ping,
    /// Stream-level error.
    Error {
        /// Error detail.
        error: ClaudeApiError,
    },
    /// Events this crate does not map.
    #[serde(other)]
    Unknown,
}

/// `content_block_delta` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeStreamDelta {
    /// Text fragment.
    TextDelta {
        /// The fragment.
        text: String,
    },
    /// Fragment of a tool-use input object.
    InputJsonDelta {
        /// Partial JSON text.
        partial_json: String,
    },
    /// Deltas this crate does not map.
    #[serde(other)]
    Unknown,
}

/// `message_delta` payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClaudeMessageDelta {
    /// Stop reason.
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// Error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaudeApiError {
    /// Error type, e.g. `overloaded_error`.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_entries_pick_the_right_shape() {
        let custom: ClaudeTool = serde_json::from_value(json!({
            "name": "get_weather", "input_schema": {"type": "object"}
        }))
        .unwrap();
        assert!(matches!(custom, ClaudeTool::Custom(_)));

        let server: ClaudeTool = serde_json::from_value(json!({
            "type": "web_search_20250305", "name": "web_search", "max_uses": 3
        }))
        .unwrap();
        assert!(matches!(server, ClaudeTool::Server(ref s) if s.max_uses == Some(3)));

        let other: ClaudeTool = serde_json::from_value(json!({"type": "bash_20250124"})).unwrap();
        assert!(matches!(other, ClaudeTool::Other(_)));
    }

    #[test]
    fn unknown_blocks_and_events_are_tolerated() {
        let resp: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "content": [
                {"type": "server_tool_use", "id": "s", "name": "web_search", "input": {}},
                {"type": "text", "text": "hi"}
            ],
            "stop_reason": "end_turn"
        }))
        .unwrap();
        assert_eq!(resp.content[0], ContentBlock::Unknown);

        let ev: ClaudeStreamEvent =
            serde_json::from_value(json!({"type": "some_future_event"})).unwrap();
        assert_eq!(ev, ClaudeStreamEvent::Unknown);
    }

    #[test]
    fn request_omits_empty_collections() {
        let req = MessagesRequest {
            model: DEFAULT_MODEL.into(),
            max_tokens: 16,
            ..Default::default()
        };
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("tools").is_none());
        assert!(v.get("mcp_servers").is_none());
        assert!(v.get("system").is_none());
    }
}
