// SPDX-License-Identifier: MIT OR Apache-2.0
//! Vendor-neutral chat messages.

use serde::{Deserialize, Serialize};

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
    /// Tool result.
    Tool,
}

impl ChatRole {
    /// Wire name of the role (`"system"`, `"user"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }

    /// Parse a vendor role string; unknown roles map to [`ChatRole::User`].
    pub fn from_wire(role: &str) -> Self {
        match role {
            "system" | "developer" => Self::System,
            "assistant" => Self::Assistant,
            "tool" => Self::Tool,
            _ => Self::User,
        }
    }
}

/// One piece of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AIContent {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// The model asks for a function to be called.
    FunctionCall {
        /// Correlation id echoed back by the matching result.
        call_id: String,
        /// Function name.
        name: String,
        /// Parsed JSON arguments.
        arguments: serde_json::Value,
    },
    /// The result of a function call.
    FunctionResult {
        /// Correlation id of the originating call.
        call_id: String,
        /// Result payload.
        result: serde_json::Value,
    },
}

impl AIContent {
    /// Text content shorthand.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// A chat message in the shared representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role.
    pub role: ChatRole,
    /// Ordered content parts.
    pub contents: Vec<AIContent>,
    /// Optional author name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    /// Vendor message id, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl ChatMessage {
    /// Create a message with a single text part.
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            contents: vec![AIContent::text(text)],
            author_name: None,
            message_id: None,
        }
    }

    /// Create a message from explicit content parts.
    pub fn with_contents(role: ChatRole, contents: Vec<AIContent>) -> Self {
        Self {
            role,
            contents,
            author_name: None,
            message_id: None,
        }
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(ChatRole::System, text)
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, text)
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.contents
            .iter()
            .filter_map(|c| match c {
                AIContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Function calls contained in this message.
    pub fn function_calls(&self) -> impl Iterator<Item = (&str, &str, &serde_json::Value)> {
        self.contents.iter().filter_map(|c| match c {
            AIContent::FunctionCall {
                call_id,
                name,
                arguments,
            } => Some((call_id.as_str(), name.as_str(), arguments)),
            _ => None,
        })
    }
}

/// Token usage reported by a vendor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageDetails {
    /// Prompt tokens.
    pub input_tokens: u64,
    /// Generated tokens.
    pub output_tokens: u64,
    /// Total tokens.
    pub total_tokens: u64,
}

impl UsageDetails {
    /// Add another usage record to this one.
    pub fn add(&mut self, other: &UsageDetails) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}
