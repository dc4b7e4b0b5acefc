// SPDX-License-Identifier: MIT OR Apache-2.0
//! Entry points for creating and retrieving hosted agents.

use std::sync::Arc;

use agentkit_core::{
    AITool, CancelToken, ChatClient, ChatClientAgent, ChatClientAgentOptions, ChatOptions,
    Credential, FunctionInvokingChatClient,
};
use agentkit_error::{AgentkitError, ErrorCode, Result};
use agentkit_openai_sdk::{OpenAIConfig, OpenAIResponsesClient, to_response_tools};
use tracing::{debug, info};

use crate::model::{
    AgentDefinition, AgentVersion, AgentVersionCreationOptions, Conversation,
    PromptAgentDefinition,
};
use crate::options::build_agent_options;
use crate::reconcile::{ToolMatchPolicy, reconcile_tools};
use crate::reference_client::AgentReferenceChatClient;
use crate::service::{AgentService, HttpAgentService, ProjectConfig};

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AgentkitError::argument_missing("name"));
    }
    Ok(())
}

fn agent_not_found(name: &str) -> AgentkitError {
    AgentkitError::new(
        ErrorCode::AgentNotFound,
        format!("Agent with name '{name}' not found."),
    )
    .with_context("agent", name)
}

/// Agents of one project.
///
/// Every agent returned talks to the project's Responses endpoint through an
/// [`AgentReferenceChatClient`] wrapped in a [`FunctionInvokingChatClient`],
/// so reconciled function tools run in process.
#[derive(Clone)]
pub struct ProjectAgents {
    service: Arc<dyn AgentService>,
    chat_client: Arc<dyn ChatClient>,
    policy: ToolMatchPolicy,
}

impl ProjectAgents {
    /// Use `service` for agent management and `chat_client` for runs.
    pub fn new(service: Arc<dyn AgentService>, chat_client: Arc<dyn ChatClient>) -> Self {
        Self {
            service,
            chat_client,
            policy: ToolMatchPolicy::default(),
        }
    }

    /// HTTP service and Responses client for the project at `config`.
    pub fn from_config(config: ProjectConfig, credential: Credential) -> Self {
        let openai = OpenAIConfig::new(config.openai_base_url())
            .with_query_param("api-version", config.api_version.clone());
        let chat_client = OpenAIResponsesClient::new(openai, credential.clone());
        let service = HttpAgentService::new(config, credential);
        Self::new(Arc::new(service), Arc::new(chat_client))
    }

    /// Change how declared function tools are matched.
    #[must_use]
    pub fn with_tool_match_policy(mut self, policy: ToolMatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The agent service.
    pub fn service(&self) -> &Arc<dyn AgentService> {
        &self.service
    }

    /// Latest version of the agent `name`.
    pub async fn get_ai_agent(
        &self,
        name: &str,
        options: Option<&ChatClientAgentOptions>,
        cancel: &CancelToken,
    ) -> Result<ChatClientAgent> {
        require_name(name)?;
        let record = self
            .service
            .get_agent(name, cancel)
            .await?
            .ok_or_else(|| agent_not_found(name))?;
        self.as_ai_agent(&record.versions.latest, options)
    }

    /// A specific version of the agent `name`.
    pub async fn get_ai_agent_version(
        &self,
        name: &str,
        version: &str,
        options: Option<&ChatClientAgentOptions>,
        cancel: &CancelToken,
    ) -> Result<ChatClientAgent> {
        require_name(name)?;
        if version.trim().is_empty() {
            return Err(AgentkitError::argument_missing("version"));
        }
        let recorded = self
            .service
            .get_agent_version(name, version, cancel)
            .await?;
        self.as_ai_agent(&recorded, options)
    }

    /// Wrap an already-fetched version. No network call is made.
    pub fn as_ai_agent(
        &self,
        version: &AgentVersion,
        options: Option<&ChatClientAgentOptions>,
    ) -> Result<ChatClientAgent> {
        if matches!(version.definition, AgentDefinition::Unsupported) {
            return Err(AgentkitError::new(
                ErrorCode::DefinitionKindUnsupported,
                format!(
                    "agent '{}' has a definition kind that cannot back a chat agent",
                    version.name
                ),
            )
            .with_context("agent", &version.name));
        }
        let effective = build_agent_options(version, options, self.policy)?;
        let reference = AgentReferenceChatClient::for_version(self.chat_client.clone(), version);
        let client = FunctionInvokingChatClient::new(Arc::new(reference));
        debug!(
            target: "agentkit.hosted",
            agent = %version.name,
            version = %version.version,
            kind = version.definition.kind(),
            "wrapping hosted agent"
        );
        Ok(ChatClientAgent::new(Arc::new(client), effective))
    }

    /// Create a prompt agent from its parts.
    pub async fn create_ai_agent(
        &self,
        name: &str,
        model: &str,
        instructions: &str,
        description: Option<&str>,
        tools: Vec<AITool>,
        cancel: &CancelToken,
    ) -> Result<ChatClientAgent> {
        require_name(name)?;
        if model.trim().is_empty() {
            return Err(AgentkitError::argument_missing("model"));
        }
        let definition = PromptAgentDefinition::new(model).with_instructions(instructions);
        let mut creation = AgentVersionCreationOptions::new(AgentDefinition::Prompt(definition));
        creation.description = description.map(str::to_owned);
        let overrides =
            ChatClientAgentOptions::new().with_chat_options(ChatOptions::new().with_tools(tools));
        self.create_ai_agent_with_options(name, creation, Some(&overrides), cancel)
            .await
    }

    /// Record a new version of `name` and wrap it.
    ///
    /// Tools must come through `overrides`; a definition that already carries
    /// tools is rejected before any request is sent.
    pub async fn create_ai_agent_with_options(
        &self,
        name: &str,
        mut creation: AgentVersionCreationOptions,
        overrides: Option<&ChatClientAgentOptions>,
        cancel: &CancelToken,
    ) -> Result<ChatClientAgent> {
        require_name(name)?;
        if !creation.definition.tools().is_empty() {
            return Err(AgentkitError::new(
                ErrorCode::InlineToolsRejected,
                "tools must be passed through the agent options, not embedded in the definition",
            )
            .with_context("agent", name));
        }
        let supplied = overrides
            .and_then(|o| o.chat_options.as_ref())
            .map(|c| c.tools.as_slice())
            .unwrap_or_default();
        match &mut creation.definition {
            AgentDefinition::Prompt(prompt) => {
                let declared = to_response_tools(supplied)?;
                // The recorded declarations must be usable under the policy
                // before anything is written to the service.
                reconcile_tools(&declared, supplied, self.policy)
                    .map_err(|e| e.with_context("agent", name))?;
                prompt.tools = declared;
            }
            AgentDefinition::Workflow(_) if !supplied.is_empty() => {
                debug!(
                    target: "agentkit.hosted",
                    agent = name,
                    "workflow definitions take no tools; ignoring supplied tools"
                );
            }
            AgentDefinition::Workflow(_) => {}
            AgentDefinition::Unsupported => {
                return Err(AgentkitError::new(
                    ErrorCode::DefinitionKindUnsupported,
                    "cannot create an agent from an unsupported definition kind",
                )
                .with_context("agent", name));
            }
        }

        let version = self
            .service
            .create_agent_version(name, &creation, cancel)
            .await?;
        info!(
            target: "agentkit.hosted",
            agent = %version.name,
            version = %version.version,
            "agent version created"
        );
        self.as_ai_agent(&version, overrides)
    }

    /// Create an empty service-side conversation.
    pub async fn create_conversation(&self, cancel: &CancelToken) -> Result<Conversation> {
        self.service.create_conversation(cancel).await
    }

    /// Delete `name` and all of its versions.
    pub async fn delete_agent(&self, name: &str, cancel: &CancelToken) -> Result<()> {
        require_name(name)?;
        self.service.delete_agent(name, cancel).await
    }
}

impl std::fmt::Debug for ProjectAgents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectAgents")
            .field("provider", &self.chat_client.metadata().provider_name)
            .field("policy", &self.policy)
            .finish()
    }
}
