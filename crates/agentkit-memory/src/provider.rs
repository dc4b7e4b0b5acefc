// SPDX-License-Identifier: MIT OR Apache-2.0
//! Context provider backed by a hosted memory store.
//!
//! Before each agent turn the provider searches the store for memories
//! relevant to the new messages and prepends them as a user message; after a
//! successful turn it sends the exchange to the store for extraction. Both
//! steps are best effort: failures are logged and the turn proceeds.

use std::sync::{Arc, Mutex, MutexGuard};

use agentkit_core::{
    AIContext, AIContextProvider, CancelToken, ChatMessage, InvokedContext, InvokingContext,
    JsonOptions,
};
use agentkit_error::{AgentkitError, ErrorCode, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::model::{
    CreateMemoryStoreRequest, MemoryInputItem, MemoryScope, MemoryStore, MemoryStoreDefinition,
    SearchMemoriesRequest, SearchOptions, UpdateMemoriesRequest,
};
use crate::service::MemoryStoreService;

/// Heading placed above retrieved memories.
pub const DEFAULT_CONTEXT_PROMPT: &str =
    "## Memories\nConsider the following memories when answering user questions:";

/// Provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedMemoryProviderOptions {
    /// Memory store name.
    pub store_name: String,
    /// Heading of the injected memory message.
    pub context_prompt: String,
    /// Upper bound on memories per search.
    pub max_memories: Option<u32>,
    /// Seconds the service waits before processing an update.
    pub update_delay: Option<u32>,
}

impl HostedMemoryProviderOptions {
    /// Options for `store_name` with defaults elsewhere.
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            context_prompt: DEFAULT_CONTEXT_PROMPT.into(),
            max_memories: None,
            update_delay: None,
        }
    }

    /// Replace the memory heading.
    #[must_use]
    pub fn with_context_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.context_prompt = prompt.into();
        self
    }

    /// Cap memories per search.
    #[must_use]
    pub fn with_max_memories(mut self, max: u32) -> Self {
        self.max_memories = Some(max);
        self
    }

    /// Set the update delay in seconds.
    #[must_use]
    pub fn with_update_delay(mut self, seconds: u32) -> Self {
        self.update_delay = Some(seconds);
        self
    }
}

/// Persistable provider state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedMemoryProviderState {
    /// Scope the provider reads and writes.
    pub scope: MemoryScope,
    /// Last search id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_search_id: Option<String>,
    /// Last update id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_update_id: Option<String>,
}

#[derive(Debug, Default)]
struct Chain {
    search: Option<String>,
    update: Option<String>,
}

/// [`AIContextProvider`] over a memory store, confined to one scope.
pub struct HostedMemoryProvider {
    service: Arc<dyn MemoryStoreService>,
    options: HostedMemoryProviderOptions,
    scope: MemoryScope,
    chain: Mutex<Chain>,
}

impl HostedMemoryProvider {
    /// Provider for `scope`.
    pub fn new(
        service: Arc<dyn MemoryStoreService>,
        scope: MemoryScope,
        options: HostedMemoryProviderOptions,
    ) -> Result<Self> {
        if options.store_name.trim().is_empty() {
            return Err(AgentkitError::argument_missing("store_name"));
        }
        Ok(Self {
            service,
            options,
            scope,
            chain: Mutex::new(Chain::default()),
        })
    }

    /// Restore a provider from [`serialize_state`](Self::serialize_state) output.
    pub fn with_state(
        service: Arc<dyn MemoryStoreService>,
        state: Value,
        options: HostedMemoryProviderOptions,
        json: &JsonOptions,
    ) -> Result<Self> {
        let state: HostedMemoryProviderState = json.from_value(state)?;
        let provider = Self::new(service, state.scope, options)?;
        *provider.chain() = Chain {
            search: state.previous_search_id,
            update: state.previous_update_id,
        };
        Ok(provider)
    }

    /// Scope and chain ids as JSON.
    pub fn serialize_state(&self, json: &JsonOptions) -> Result<Value> {
        json.to_value(&self.state())
    }

    /// Current state.
    pub fn state(&self) -> HostedMemoryProviderState {
        let chain = self.chain();
        HostedMemoryProviderState {
            scope: self.scope.clone(),
            previous_search_id: chain.search.clone(),
            previous_update_id: chain.update.clone(),
        }
    }

    /// The scope.
    pub fn scope(&self) -> &MemoryScope {
        &self.scope
    }

    /// Settings.
    pub fn options(&self) -> &HostedMemoryProviderOptions {
        &self.options
    }

    fn chain(&self) -> MutexGuard<'_, Chain> {
        self.chain.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Delete every memory in the scope. A scope the store does not know is
    /// treated as already clear.
    pub async fn clear_stored_memories(&self, cancel: &CancelToken) -> Result<()> {
        match self
            .service
            .delete_scope(&self.options.store_name, &self.scope, cancel)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(target: "agentkit.memory", scope = %self.scope, "scope already empty");
            }
            Err(e) => return Err(e),
        }
        *self.chain() = Chain::default();
        Ok(())
    }

    /// Create the store unless it exists. A concurrent creation is tolerated.
    pub async fn ensure_memory_store(
        &self,
        definition: MemoryStoreDefinition,
        description: Option<String>,
        cancel: &CancelToken,
    ) -> Result<MemoryStore> {
        let name = &self.options.store_name;
        if let Some(store) = self.service.get_memory_store(name, cancel).await? {
            return Ok(store);
        }
        let request = CreateMemoryStoreRequest {
            name: name.clone(),
            description,
            definition,
        };
        match self.service.create_memory_store(&request, cancel).await {
            Ok(store) => {
                info!(target: "agentkit.memory", store = %store.name, "memory store created");
                Ok(store)
            }
            Err(e) if e.http_status() == Some(409) => self
                .service
                .get_memory_store(name, cancel)
                .await?
                .ok_or_else(|| {
                    AgentkitError::new(
                        ErrorCode::ResourceNotFound,
                        format!("memory store '{name}' reported as existing but not found"),
                    )
                    .with_context("memory_store", name)
                }),
            Err(e) => Err(e),
        }
    }

    fn memory_message(&self, memories: &[String]) -> ChatMessage {
        ChatMessage::user(format!(
            "{}\n{}",
            self.options.context_prompt,
            memories.join("\n")
        ))
    }
}

#[async_trait]
impl AIContextProvider for HostedMemoryProvider {
    async fn invoking(
        &self,
        context: InvokingContext<'_>,
        cancel: &CancelToken,
    ) -> Result<AIContext> {
        let items = MemoryInputItem::from_messages(context.request_messages);
        if items.is_empty() {
            return Ok(AIContext::default());
        }
        let request = SearchMemoriesRequest {
            scope: self.scope.clone(),
            items,
            previous_search_id: self.chain().search.clone(),
            options: self.options.max_memories.map(|max| SearchOptions {
                max_memories: Some(max),
            }),
        };
        let response = match self
            .service
            .search_memories(&self.options.store_name, &request, cancel)
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!(
                    target: "agentkit.memory",
                    scope = %self.scope,
                    error = %e,
                    "memory search failed"
                );
                return Ok(AIContext::default());
            }
        };
        if let Some(id) = response.search_id {
            self.chain().search = Some(id);
        }

        let memories: Vec<String> = response
            .memories
            .into_iter()
            .map(|hit| hit.memory_item.content)
            .filter(|c| !c.trim().is_empty())
            .collect();
        debug!(
            target: "agentkit.memory",
            scope = %self.scope,
            found = memories.len(),
            "memory search"
        );
        if memories.is_empty() {
            return Ok(AIContext::default());
        }
        Ok(AIContext {
            messages: vec![self.memory_message(&memories)],
            ..AIContext::default()
        })
    }

    async fn invoked(&self, context: InvokedContext<'_>, cancel: &CancelToken) -> Result<()> {
        if context.error.is_some() {
            return Ok(());
        }
        let items = MemoryInputItem::from_messages(
            context
                .request_messages
                .iter()
                .chain(context.response_messages),
        );
        if items.is_empty() {
            return Ok(());
        }
        let request = UpdateMemoriesRequest {
            scope: self.scope.clone(),
            items,
            previous_update_id: self.chain().update.clone(),
            update_delay: self.options.update_delay,
        };
        match self
            .service
            .update_memories(&self.options.store_name, &request, cancel)
            .await
        {
            Ok(response) => {
                debug!(
                    target: "agentkit.memory",
                    scope = %self.scope,
                    status = ?response.status,
                    "memory update queued"
                );
                if let Some(id) = response.update_id {
                    self.chain().update = Some(id);
                }
                Ok(())
            }
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                warn!(
                    target: "agentkit.memory",
                    scope = %self.scope,
                    error = %e,
                    "memory update failed"
                );
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for HostedMemoryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedMemoryProvider")
            .field("scope", &self.scope)
            .field("options", &self.options)
            .finish()
    }
}
