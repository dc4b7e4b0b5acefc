// SPDX-License-Identifier: MIT OR Apache-2.0
//! agentkit-hosted
//!
//! Client for a hosted agent service. Agents and their immutable versions are
//! recorded server-side; this crate fetches or creates them, reconciles the
//! tools a definition declares with the implementations the caller supplies,
//! and wraps the result in a [`agentkit_core::ChatClientAgent`] whose requests
//! reference the recorded agent.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod options;
pub mod project;
pub mod reconcile;
pub mod reference_client;
pub mod service;

pub use model::{
    AgentDefinition, AgentRecord, AgentReference, AgentVersion, AgentVersionCreationOptions,
    AgentVersions, Conversation, PromptAgentDefinition, StructuredInputDefinition,
    WorkflowAgentDefinition,
};
pub use options::{build_agent_options, default_agent_id};
pub use project::ProjectAgents;
pub use reconcile::{ToolMatchPolicy, reconcile_tools};
pub use reference_client::{AGENT_PROPERTY, AgentReferenceChatClient};
pub use service::{AgentService, DEFAULT_API_VERSION, HttpAgentService, ProjectConfig};
