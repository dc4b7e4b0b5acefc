// SPDX-License-Identifier: MIT OR Apache-2.0
//! Chat client wrapper that targets a server-side agent.

use std::sync::Arc;

use agentkit_core::{
    CancelToken, ChatClient, ChatClientMetadata, ChatMessage, ChatOptions, ChatResponse,
    ChatResponseStream,
};
use agentkit_error::Result;
use async_trait::async_trait;
use tracing::trace;

use crate::model::{AgentDefinition, AgentReference, AgentVersion};

/// Request property carrying the agent reference.
pub const AGENT_PROPERTY: &str = "agent";

/// Delegating [`ChatClient`] that adds an agent reference to every request.
///
/// Instructions, sampling parameters and tools belong to the recorded
/// definition, so any per-request values are removed before forwarding.
/// The model is replaced by the one the definition records, if any.
#[derive(Clone)]
pub struct AgentReferenceChatClient {
    inner: Arc<dyn ChatClient>,
    reference: AgentReference,
    model: Option<String>,
}

impl AgentReferenceChatClient {
    /// Wrap `inner` for `reference`.
    pub fn new(inner: Arc<dyn ChatClient>, reference: AgentReference) -> Self {
        Self {
            inner,
            reference,
            model: None,
        }
    }

    /// Wrap `inner` for a recorded version.
    pub fn for_version(inner: Arc<dyn ChatClient>, version: &AgentVersion) -> Self {
        let model = match &version.definition {
            AgentDefinition::Prompt(p) if !p.model.is_empty() => Some(p.model.clone()),
            _ => None,
        };
        Self {
            inner,
            reference: AgentReference::new(version.name.clone(), Some(version.version.clone())),
            model,
        }
    }

    /// The reference sent with each request.
    pub fn reference(&self) -> &AgentReference {
        &self.reference
    }

    fn rewrite(&self, options: &ChatOptions) -> ChatOptions {
        let mut out = options.clone();
        out.instructions = None;
        out.temperature = None;
        out.top_p = None;
        out.tools.clear();
        out.tool_mode = None;
        out.model_id = self.model.clone();
        let reference = serde_json::to_value(&self.reference).unwrap_or_default();
        out.additional_properties
            .insert(AGENT_PROPERTY.to_owned(), reference);
        trace!(target: "agentkit.hosted", agent = %self.reference.name, "attached agent reference");
        out
    }
}

#[async_trait]
impl ChatClient for AgentReferenceChatClient {
    fn metadata(&self) -> ChatClientMetadata {
        self.inner.metadata()
    }

    async fn get_response(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancelToken,
    ) -> Result<ChatResponse> {
        self.inner
            .get_response(messages, &self.rewrite(options), cancel)
            .await
    }

    async fn get_streaming_response(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancelToken,
    ) -> Result<ChatResponseStream> {
        self.inner
            .get_streaming_response(messages, &self.rewrite(options), cancel)
            .await
    }
}

impl std::fmt::Debug for AgentReferenceChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentReferenceChatClient")
            .field("reference", &self.reference)
            .field("model", &self.model)
            .finish()
    }
}
