// SPDX-License-Identifier: MIT OR Apache-2.0
//! Agents built on a [`ChatClient`].
//!
//! A [`ChatClientAgent`] pairs a chat client with [`ChatClientAgentOptions`]
//! (identity, instructions and default chat options) and keeps conversation
//! state in an [`AgentThread`].

use std::sync::{Arc, Mutex, MutexGuard};

use agentkit_error::Result;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::chat::{ChatClient, ChatOptions, ChatResponse, ChatResponseUpdate};
use crate::context::{AIContextProvider, InvokedContext, InvokingContext};
use crate::json::JsonOptions;
use crate::message::{ChatMessage, UsageDetails};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Effective configuration of a chat-client agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatClientAgentOptions {
    /// Agent id; a random id is generated when absent.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// System instructions.
    pub instructions: Option<String>,
    /// Default chat options for every run.
    pub chat_options: Option<ChatOptions>,
}

impl ChatClientAgentOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the instructions.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Set the default chat options.
    #[must_use]
    pub fn with_chat_options(mut self, options: ChatOptions) -> Self {
        self.chat_options = Some(options);
        self
    }
}

// ---------------------------------------------------------------------------
// Thread
// ---------------------------------------------------------------------------

/// Serialisable thread contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadState {
    /// Service-side conversation id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Locally kept history, used when the service keeps none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<ChatMessage>,
}

/// Conversation state shared between an agent and its caller.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct AgentThread {
    state: Arc<Mutex<ThreadState>>,
}

impl AgentThread {
    /// Empty thread.
    pub fn new() -> Self {
        Self::default()
    }

    /// Thread bound to an existing service conversation.
    pub fn with_conversation_id(id: impl Into<String>) -> Self {
        Self::from_state(ThreadState {
            conversation_id: Some(id.into()),
            messages: Vec::new(),
        })
    }

    /// Thread from saved state.
    pub fn from_state(state: ThreadState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ThreadState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Service conversation id, if bound.
    pub fn conversation_id(&self) -> Option<String> {
        self.lock().conversation_id.clone()
    }

    /// Locally kept messages.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages.clone()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> ThreadState {
        self.lock().clone()
    }

    /// Serialize the thread.
    pub fn serialize(&self, json: &JsonOptions) -> Result<Value> {
        json.to_value(&self.snapshot())
    }

    /// Restore a thread produced by [`AgentThread::serialize`].
    pub fn deserialize(value: Value, json: &JsonOptions) -> Result<Self> {
        Ok(Self::from_state(json.from_value(value)?))
    }

    /// Record a completed turn.
    pub(crate) fn record(&self, request: &[ChatMessage], response: &ChatResponse) {
        let mut state = self.lock();
        match &response.conversation_id {
            Some(id) => {
                state.conversation_id = Some(id.clone());
                state.messages.clear();
            }
            None => {
                state.messages.extend(request.iter().cloned());
                state.messages.extend(response.messages.iter().cloned());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Result of a non-streaming agent run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentRunResponse {
    /// Id of the agent that produced the response.
    pub agent_id: String,
    /// Response messages.
    pub messages: Vec<ChatMessage>,
    /// Vendor response id.
    pub response_id: Option<String>,
    /// Token usage.
    pub usage: Option<UsageDetails>,
}

impl AgentRunResponse {
    /// Concatenated text of all messages.
    pub fn text(&self) -> String {
        self.messages.iter().map(ChatMessage::text).collect()
    }
}

/// One streamed fragment of an agent run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRunResponseUpdate {
    /// Id of the agent that produced the fragment.
    pub agent_id: String,
    /// The underlying chat fragment.
    pub update: ChatResponseUpdate,
}

impl AgentRunResponseUpdate {
    /// Text of the fragment.
    pub fn text(&self) -> String {
        self.update.text_content()
    }
}

/// Boxed stream of agent fragments.
pub type AgentRunResponseStream =
    std::pin::Pin<Box<dyn futures::Stream<Item = Result<AgentRunResponseUpdate>> + Send>>;

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// An agent that talks to a [`ChatClient`].
#[derive(Clone)]
pub struct ChatClientAgent {
    id: String,
    client: Arc<dyn ChatClient>,
    options: ChatClientAgentOptions,
    context_provider: Option<Arc<dyn AIContextProvider>>,
}

struct PreparedRun {
    messages: Vec<ChatMessage>,
    options: ChatOptions,
}

impl ChatClientAgent {
    /// Create an agent.
    pub fn new(client: Arc<dyn ChatClient>, options: ChatClientAgentOptions) -> Self {
        let id = options
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self {
            id,
            client,
            options,
            context_provider: None,
        }
    }

    /// Attach a context provider consulted on every run.
    #[must_use]
    pub fn with_context_provider(mut self, provider: Arc<dyn AIContextProvider>) -> Self {
        self.context_provider = Some(provider);
        self
    }

    /// Agent id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Agent name.
    pub fn name(&self) -> Option<&str> {
        self.options.name.as_deref()
    }

    /// Agent description.
    pub fn description(&self) -> Option<&str> {
        self.options.description.as_deref()
    }

    /// Agent instructions.
    pub fn instructions(&self) -> Option<&str> {
        self.options.instructions.as_deref()
    }

    /// Effective options.
    pub fn options(&self) -> &ChatClientAgentOptions {
        &self.options
    }

    /// The chat client used for runs.
    pub fn chat_client(&self) -> &Arc<dyn ChatClient> {
        &self.client
    }

    /// Start a new, empty thread.
    pub fn get_new_thread(&self) -> AgentThread {
        AgentThread::new()
    }

    async fn prepare(
        &self,
        input: &[ChatMessage],
        thread: &AgentThread,
        run_options: Option<&ChatOptions>,
        cancel: &CancelToken,
    ) -> Result<PreparedRun> {
        cancel.check()?;
        let mut defaults = self.options.chat_options.clone().unwrap_or_default();
        if let Some(instructions) = &self.options.instructions {
            defaults.instructions = Some(match defaults.instructions.take() {
                Some(extra) if &extra != instructions => format!("{instructions}\n{extra}"),
                _ => instructions.clone(),
            });
        }
        let mut options = match run_options {
            Some(run) => run.merged_over(&defaults),
            None => defaults,
        };

        let state = thread.snapshot();
        let mut messages = Vec::new();
        match state.conversation_id {
            Some(id) => options.conversation_id = Some(id),
            None => messages.extend(state.messages),
        }

        let mut turn = input.to_vec();
        if let Some(provider) = &self.context_provider {
            let context = provider
                .invoking(InvokingContext { request_messages: input }, cancel)
                .await?;
            if !context.is_empty() {
                debug!(target: "agentkit.core", agent = %self.id, "applying provider context");
            }
            context.apply(&mut turn, &mut options);
        }
        messages.extend(turn);
        Ok(PreparedRun { messages, options })
    }

    /// Run the agent on `messages`.
    pub async fn run(
        &self,
        messages: Vec<ChatMessage>,
        thread: Option<&AgentThread>,
        run_options: Option<&ChatOptions>,
        cancel: &CancelToken,
    ) -> Result<AgentRunResponse> {
        let scratch = AgentThread::new();
        let thread = thread.unwrap_or(&scratch);
        let prepared = self.prepare(&messages, thread, run_options, cancel).await?;

        debug!(
            target: "agentkit.core",
            agent = %self.id,
            messages = prepared.messages.len(),
            "running agent"
        );
        let result = self
            .client
            .get_response(&prepared.messages, &prepared.options, cancel)
            .await;

        let mut response = match result {
            Ok(r) => r,
            Err(err) => {
                self.notify_invoked(&messages, &[], Some(&err), cancel).await;
                return Err(err);
            }
        };
        if let Some(name) = &self.options.name {
            for msg in &mut response.messages {
                msg.author_name.get_or_insert_with(|| name.clone());
            }
        }
        self.notify_invoked(&messages, &response.messages, None, cancel)
            .await;
        thread.record(&messages, &response);

        Ok(AgentRunResponse {
            agent_id: self.id.clone(),
            messages: response.messages,
            response_id: response.response_id,
            usage: response.usage,
        })
    }

    /// Run the agent on a single user message.
    pub async fn run_text(
        &self,
        text: impl Into<String>,
        thread: Option<&AgentThread>,
        cancel: &CancelToken,
    ) -> Result<AgentRunResponse> {
        self.run(vec![ChatMessage::user(text)], thread, None, cancel)
            .await
    }

    /// Run the agent and stream its output.
    ///
    /// The thread and context provider observe the turn once the stream has
    /// been consumed to the end; dropping the stream early leaves the thread
    /// unchanged.
    pub async fn run_streaming(
        &self,
        messages: Vec<ChatMessage>,
        thread: Option<&AgentThread>,
        run_options: Option<&ChatOptions>,
        cancel: &CancelToken,
    ) -> Result<AgentRunResponseStream> {
        let thread = thread.cloned().unwrap_or_default();
        let prepared = self.prepare(&messages, &thread, run_options, cancel).await?;
        let mut inner = self
            .client
            .get_streaming_response(&prepared.messages, &prepared.options, cancel)
            .await?;

        let (tx, rx) = mpsc::channel(64);
        let agent = self.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut updates = Vec::new();
            while let Some(item) = inner.next().await {
                match item {
                    Ok(mut update) => {
                        if update.author_name.is_none() {
                            update.author_name = agent.options.name.clone();
                        }
                        updates.push(update.clone());
                        let out = AgentRunResponseUpdate {
                            agent_id: agent.id.clone(),
                            update,
                        };
                        if tx.send(Ok(out)).await.is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        agent
                            .notify_invoked(&messages, &[], Some(&err), &cancel)
                            .await;
                        let _ = tx.send(Err(err)).await;
                        return;
                    }
                }
            }
            let response = ChatResponse::from_updates(updates);
            agent
                .notify_invoked(&messages, &response.messages, None, &cancel)
                .await;
            thread.record(&messages, &response);
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn notify_invoked(
        &self,
        request: &[ChatMessage],
        response: &[ChatMessage],
        error: Option<&agentkit_error::AgentkitError>,
        cancel: &CancelToken,
    ) {
        let Some(provider) = &self.context_provider else {
            return;
        };
        let context = InvokedContext {
            request_messages: request,
            response_messages: response,
            error,
        };
        if let Err(e) = provider.invoked(context, cancel).await {
            warn!(
                target: "agentkit.core",
                agent = %self.id,
                error = %e,
                "context provider failed after invocation"
            );
        }
    }
}

impl std::fmt::Debug for ChatClientAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClientAgent")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("provider", &self.client.metadata().provider_name)
            .finish()
    }
}
