// SPDX-License-Identifier: MIT OR Apache-2.0
//! OpenAI Responses dialect: config and wire types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default base URL of the public API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model used when neither options nor config name one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Endpoint configuration for [`crate::client::OpenAIResponsesClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAIConfig {
    /// Base URL; `/responses` is appended.
    pub base_url: String,
    /// Model used when the request does not name one.
    pub model: String,
    /// Query parameters added to every request (e.g. `api-version`).
    pub query_params: BTreeMap<String, String>,
    /// Extra headers added to every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            query_params: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }
}

impl OpenAIConfig {
    /// Config for `base_url` with the default model.
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

    /// Add a query parameter.
    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
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

/// A tool descriptor as it appears in the request `tools` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseToolDescriptor {
    /// A tool type this crate models.
    Known(ResponseTool),
    /// Any other descriptor, passed through verbatim.
    Other(Value),
}

/// Tool types modelled by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseTool {
    /// Function tool.
    Function(FunctionTool),
    /// Web search.
    #[serde(alias = "web_search_preview")]
    WebSearch(WebSearchToolSpec),
    /// Vector store search.
    FileSearch(FileSearchToolSpec),
    /// Code interpreter.
    CodeInterpreter(CodeInterpreterToolSpec),
    /// Remote MCP server.
    Mcp(McpToolSpec),
}

/// `{"type": "function", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    /// Function name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    /// Strict schema adherence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

/// Approximate location for web search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproximateLocation {
    /// Always `"approximate"`.
    #[serde(rename = "type", default = "approximate")]
    pub kind: String,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Timezone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

fn approximate() -> String {
    "approximate".into()
}

/// `{"type": "web_search", ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchToolSpec {
    /// Location hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_location: Option<ApproximateLocation>,
    /// `"low"`, `"medium"` or `"high"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_context_size: Option<String>,
}

/// `{"type": "file_search", ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSearchToolSpec {
    /// Vector stores to search.
    pub vector_store_ids: Vec<String>,
    /// Result cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_num_results: Option<u32>,
}

/// `{"type": "code_interpreter", "container": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeInterpreterToolSpec {
    /// Execution container.
    pub container: CodeInterpreterContainer,
}

/// Container reference: an existing id or an auto-provisioned container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeInterpreterContainer {
    /// Existing container id.
    Id(String),
    /// `{"type": "auto", "file_ids": [...]}`.
    Auto(AutoContainer),
}

/// Auto-provisioned container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoContainer {
    /// Always `"auto"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Files copied into the container.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_ids: Vec<String>,
}

impl AutoContainer {
    /// Auto container seeded with `file_ids`.
    pub fn new(file_ids: Vec<String>) -> Self {
        Self {
            kind: "auto".into(),
            file_ids,
        }
    }
}

/// `{"type": "mcp", ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpToolSpec {
    /// Server label.
    pub server_label: String,
    /// Server URL, for URL-addressed servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    /// Connector id, for vendor connectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<String>,
    /// Allowed sub-tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    /// Approval policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_approval: Option<McpRequireApproval>,
    /// Headers sent to the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// OAuth access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
}

/// `"always"` / `"never"` or per-tool filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum McpRequireApproval {
    /// Blanket setting.
    Mode(McpApprovalSetting),
    /// Per-tool filters.
    Filter {
        /// Tools that always need approval.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        always: Option<McpToolFilter>,
        /// Tools that never need approval.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        never: Option<McpToolFilter>,
    },
}

/// Blanket approval setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpApprovalSetting {
    /// Every call needs approval.
    Always,
    /// No call needs approval.
    Never,
}

/// `{"tool_names": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpToolFilter {
    /// Tool names.
    #[serde(default)]
    pub tool_names: Vec<String>,
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// `POST /responses` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsesRequest {
    /// Model or deployment.
    pub model: String,
    /// Input items.
    pub input: Vec<InputItem>,
    /// System instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Chain onto a stored response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    /// Service-side conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Output cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Tools.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ResponseToolDescriptor>,
    /// Tool choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    /// Stream the response as SSE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Members merged from `ChatOptions::additional_properties`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ResponsesRequest {
    /// Whether the service stores the response (default `true`).
    pub fn store(&self) -> bool {
        self.extra
            .get("store")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }
}

/// Input item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    /// A chat message.
    Message {
        /// `"system"`, `"user"`, `"assistant"` or `"developer"`.
        role: String,
        /// Content parts.
        content: Vec<MessageContent>,
    },
    /// A function call previously made by the model.
    FunctionCall {
        /// Correlation id.
        call_id: String,
        /// Function name.
        name: String,
        /// JSON-encoded arguments.
        arguments: String,
    },
    /// Result of a function call.
    FunctionCallOutput {
        /// Correlation id.
        call_id: String,
        /// Result text.
        output: String,
    },
}

/// Content part in input and output messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Text sent by the user or system.
    InputText {
        /// The text.
        text: String,
    },
    /// Text produced by the model.
    OutputText {
        /// The text.
        text: String,
    },
    /// Model refusal.
    Refusal {
        /// Refusal text.
        refusal: String,
    },
    /// Parts this crate does not model.
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// `POST /responses` result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsesResponse {
    /// Response id (`resp_...`).
    pub id: String,
    /// Model that answered.
    #[serde(default)]
    pub model: Option<String>,
    /// `completed`, `incomplete`, `failed`, `in_progress`.
    #[serde(default)]
    pub status: Option<String>,
    /// Output items.
    #[serde(default)]
    pub output: Vec<OutputItem>,
    /// Token usage.
    #[serde(default)]
    pub usage: Option<ResponseUsage>,
    /// Conversation the response belongs to.
    #[serde(default)]
    pub conversation: Option<ConversationRef>,
    /// Failure detail.
    #[serde(default)]
    pub error: Option<ResponseError>,
    /// Why the response is incomplete.
    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,
}

/// Output item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// Assistant message.
    Message {
        /// Item id.
        #[serde(default)]
        id: Option<String>,
        /// Role, normally `"assistant"`.
        #[serde(default = "assistant_role")]
        role: String,
        /// Content parts.
        #[serde(default)]
        content: Vec<MessageContent>,
    },
    /// Function call request.
    FunctionCall {
        /// Item id.
        #[serde(default)]
        id: Option<String>,
        /// Correlation id.
        call_id: String,
        /// Function name.
        name: String,
        /// JSON-encoded arguments.
        #[serde(default)]
        arguments: String,
    },
    /// Items executed by the service (searches, MCP calls, reasoning, ...).
    #[serde(other)]
    Unknown,
}

fn assistant_role() -> String {
    "assistant".into()
}

/// Token usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseUsage {
    /// Prompt tokens.
    #[serde(default)]
    pub input_tokens: u64,
    /// Generated tokens.
    #[serde(default)]
    pub output_tokens: u64,
    /// Total tokens.
    #[serde(default)]
    pub total_tokens: u64,
}

/// `{"id": "conv_..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRef {
    /// Conversation id.
    pub id: String,
}

/// Failure detail on a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Vendor error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Message.
    #[serde(default)]
    pub message: String,
}

/// `{"reason": "max_output_tokens"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncompleteDetails {
    /// Reason.
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_tool_type_falls_back_to_other() {
        let raw = json!({"type": "image_generation", "size": "1024x1024"});
        let d: ResponseToolDescriptor = serde_json::from_value(raw).unwrap();
        assert!(matches!(d, ResponseToolDescriptor::Other(_)));
    }

    #[test]
    fn web_search_preview_alias_is_accepted() {
        let d: ResponseToolDescriptor =
            serde_json::from_value(json!({"type": "web_search_preview"})).unwrap();
        assert!(matches!(
            d,
            ResponseToolDescriptor::Known(ResponseTool::WebSearch(_))
        ));
    }

    #[test]
    fn request_flattens_extra_members() {
        let mut req = ResponsesRequest {
            model: "gpt-4o".into(),
            ..Default::default()
        };
        req.extra.insert("store".into(), json!(false));
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["store"], json!(false));
        assert!(v.get("tools").is_none());
        assert!(!req.store());
    }

    #[test]
    fn unknown_output_items_are_tolerated() {
        let r: ResponsesResponse = serde_json::from_value(json!({
            "id": "resp_1",
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "id": "msg_1", "content": [{"type": "output_text", "text": "hi", "annotations": []}]}
            ]
        }))
        .unwrap();
        assert_eq!(r.output.len(), 2);
        assert_eq!(r.output[0], OutputItem::Unknown);
    }

    #[test]
    fn approval_filter_shape() {
        let v = serde_json::to_value(McpRequireApproval::Filter {
            always: Some(McpToolFilter {
                tool_names: vec!["delete".into()],
            }),
            never: None,
        })
        .unwrap();
        assert_eq!(v, json!({"always": {"tool_names": ["delete"]}}));
        let mode: McpRequireApproval = serde_json::from_value(json!("never")).unwrap();
        assert_eq!(mode, McpRequireApproval::Mode(McpApprovalSetting::Never));
    }
}
