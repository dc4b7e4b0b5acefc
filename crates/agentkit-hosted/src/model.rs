// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wire model of the hosted agent service.

use std::collections::BTreeMap;

use agentkit_openai_sdk::ResponseToolDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Server-recorded agent configuration, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentDefinition {
    /// Model + instructions + tools.
    Prompt(PromptAgentDefinition),
    /// Declarative multi-agent workflow.
    Workflow(WorkflowAgentDefinition),
    /// A kind this crate does not model.
    #[serde(other)]
    Unsupported,
}

impl AgentDefinition {
    /// The `kind` string.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Prompt(_) => "prompt",
            Self::Workflow(_) => "workflow",
            Self::Unsupported => "unsupported",
        }
    }

    /// Declared tools; empty for non-prompt kinds.
    pub fn tools(&self) -> &[ResponseToolDescriptor] {
        match self {
            Self::Prompt(p) => &p.tools,
            _ => &[],
        }
    }

    /// Instructions of a prompt definition.
    pub fn instructions(&self) -> Option<&str> {
        match self {
            Self::Prompt(p) => p.instructions.as_deref(),
            _ => None,
        }
    }
}

/// `{"kind": "prompt", ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptAgentDefinition {
    /// Model deployment name.
    pub model: String,
    /// System instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Declared tools, in Responses descriptor form.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ResponseToolDescriptor>,
    /// Named inputs substituted into the instructions.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub structured_inputs: BTreeMap<String, StructuredInputDefinition>,
}

impl PromptAgentDefinition {
    /// Definition for `model`.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Set the instructions.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// One structured input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredInputDefinition {
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value used when the caller supplies none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Whether the input must be supplied.
    #[serde(default)]
    pub required: bool,
}

/// `{"kind": "workflow", ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowAgentDefinition {
    /// Workflow document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
}

// ---------------------------------------------------------------------------
// Versions and records
// ---------------------------------------------------------------------------

/// Immutable snapshot of a definition, identified by name and version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentVersion {
    /// Version id.
    #[serde(default)]
    pub id: String,
    /// Agent name.
    pub name: String,
    /// Version label.
    pub version: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time, seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    /// The definition.
    pub definition: AgentDefinition,
}

impl AgentVersion {
    /// Creation time as a timestamp.
    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_at, 0)
    }
}

/// An agent and its versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Agent id.
    #[serde(default)]
    pub id: String,
    /// Agent name.
    pub name: String,
    /// Version summary.
    pub versions: AgentVersions,
}

/// `{"latest": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentVersions {
    /// Most recent version.
    pub latest: AgentVersion,
}

/// Body of `POST /agents/{name}/versions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentVersionCreationOptions {
    /// The definition to record.
    pub definition: AgentDefinition,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl AgentVersionCreationOptions {
    /// Options recording `definition`.
    pub fn new(definition: AgentDefinition) -> Self {
        Self {
            definition,
            description: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// `{"type": "agent_reference", "name": ..., "version": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReference {
    /// Always `"agent_reference"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Agent name.
    pub name: String,
    /// Pinned version; latest when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl AgentReference {
    /// Reference to `name`, optionally pinned to `version`.
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            kind: "agent_reference".into(),
            name: name.into(),
            version,
        }
    }
}

/// A service-side conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation id (`conv_...`).
    pub id: String,
    /// Creation time, seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}
