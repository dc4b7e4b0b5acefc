// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wire model of the memory store API.

use std::fmt;

use agentkit_core::{ChatMessage, ChatRole};
use agentkit_error::{AgentkitError, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Partition key isolating one caller's memories, e.g. a user id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemoryScope(String);

impl MemoryScope {
    /// Wrap `scope`; blank values are rejected.
    pub fn new(scope: impl Into<String>) -> Result<Self> {
        let scope = scope.into();
        if scope.trim().is_empty() {
            return Err(AgentkitError::argument_missing("scope"));
        }
        Ok(Self(scope))
    }

    /// The scope string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MemoryScope {
    type Error = AgentkitError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<MemoryScope> for String {
    fn from(scope: MemoryScope) -> Self {
        scope.0
    }
}

impl fmt::Display for MemoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// A conversation message sent for search or extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryInputItem {
    /// Always `"message"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl MemoryInputItem {
    /// Convert user and assistant messages with text; others are skipped.
    pub fn from_message(message: &ChatMessage) -> Option<Self> {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            _ => return None,
        };
        let text = message.text();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self {
            kind: "message".into(),
            role: role.into(),
            content: text,
        })
    }

    /// Convert every eligible message in order.
    pub fn from_messages<'a>(messages: impl IntoIterator<Item = &'a ChatMessage>) -> Vec<Self> {
        messages.into_iter().filter_map(Self::from_message).collect()
    }
}

/// A stored memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Memory id.
    #[serde(default)]
    pub memory_id: String,
    /// Remembered fact.
    pub content: String,
    /// `user_profile`, `chat_summary`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Scope the memory belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Last update, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

// ---------------------------------------------------------------------------
// Search / update / delete
// ---------------------------------------------------------------------------

/// Search tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Upper bound on memories returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_memories: Option<u32>,
}

/// Body of `:search_memories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMemoriesRequest {
    /// Scope searched.
    pub scope: MemoryScope,
    /// Conversation the search is for.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<MemoryInputItem>,
    /// Search this one continues.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_search_id: Option<String>,
    /// Tuning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<SearchOptions>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySearchHit {
    /// The memory.
    pub memory_item: MemoryItem,
}

/// Answer of `:search_memories`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMemoriesResponse {
    /// Id to chain the next search onto.
    #[serde(default)]
    pub search_id: Option<String>,
    /// Hits, most relevant first.
    #[serde(default)]
    pub memories: Vec<MemorySearchHit>,
}

/// Body of `:update_memories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateMemoriesRequest {
    /// Scope written.
    pub scope: MemoryScope,
    /// Messages to extract memories from.
    pub items: Vec<MemoryInputItem>,
    /// Update this one continues.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_update_id: Option<String>,
    /// Seconds the service waits before processing, batching close updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_delay: Option<u32>,
}

/// Answer of `:update_memories`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMemoriesResponse {
    /// Id to chain the next update onto.
    #[serde(default)]
    pub update_id: Option<String>,
    /// `queued`, `in_progress`, `completed`, ...
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of `:delete_scope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteScopeRequest {
    /// Scope whose memories are removed.
    pub scope: MemoryScope,
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Models a store extracts and embeds with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStoreDefinition {
    /// Always `"default"`.
    pub kind: String,
    /// Chat model deployment used for extraction.
    pub chat_model: String,
    /// Embedding model deployment.
    pub embedding_model: String,
}

impl MemoryStoreDefinition {
    /// Default-kind definition.
    pub fn new(chat_model: impl Into<String>, embedding_model: impl Into<String>) -> Self {
        Self {
            kind: "default".into(),
            chat_model: chat_model.into(),
            embedding_model: embedding_model.into(),
        }
    }
}

/// A memory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStore {
    /// Store id.
    #[serde(default)]
    pub id: String,
    /// Store name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Models used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<MemoryStoreDefinition>,
}

/// Body of `POST /memory_stores`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMemoryStoreRequest {
    /// Store name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Models used.
    pub definition: MemoryStoreDefinition,
}
