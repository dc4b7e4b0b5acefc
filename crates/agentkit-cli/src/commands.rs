// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sample implementations behind each subcommand.

use std::io::Write;
use std::sync::Arc;

use agentkit_claude_sdk::{AnthropicChatClient, ClaudeConfig};
use agentkit_config::AgentkitConfig;
use agentkit_core::{
    AITool, AgentThread, CancelToken, ChatClientAgent, ChatClientAgentOptions, ChatMessage,
    Credential, StaticTokenProvider, function,
};
use agentkit_hosted::{ProjectAgents, ProjectConfig};
use agentkit_memory::{
    HostedMemoryProvider, HostedMemoryProviderOptions, HttpMemoryStoreService, MemoryScope,
    MemoryStoreDefinition,
};
use agentkit_openai_sdk::{OpenAIConfig, OpenAIResponsesClient};
use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use tokio_stream::StreamExt;
use tracing::info;

/// Embedding deployment used when the config names none.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// How agent output is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunMode {
    /// Print updates as they arrive.
    pub stream: bool,
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

fn project_config(config: &AgentkitConfig) -> Result<ProjectConfig> {
    let endpoint = config.require_project_endpoint()?;
    let mut project = ProjectConfig::new(endpoint);
    if let Some(version) = config.project.as_ref().and_then(|p| p.api_version.clone()) {
        project = project.with_api_version(version);
    }
    Ok(project)
}

fn project_credential(config: &AgentkitConfig) -> Result<Credential> {
    let token = config
        .project
        .as_ref()
        .and_then(|p| p.token.clone())
        .context("missing project token (set AZURE_FOUNDRY_PROJECT_TOKEN or project.token)")?;
    Ok(Credential::token_provider(StaticTokenProvider::new(token)))
}

fn project_agents(config: &AgentkitConfig) -> Result<ProjectAgents> {
    Ok(ProjectAgents::from_config(
        project_config(config)?,
        project_credential(config)?,
    ))
}

async fn run_agent(
    agent: &ChatClientAgent,
    prompt: &str,
    thread: Option<&AgentThread>,
    mode: RunMode,
    cancel: &CancelToken,
) -> Result<()> {
    if !mode.stream {
        let response = agent
            .run(vec![ChatMessage::user(prompt)], thread, None, cancel)
            .await?;
        println!("{}", response.text());
        return Ok(());
    }
    let mut updates = agent
        .run_streaming(vec![ChatMessage::user(prompt)], thread, None, cancel)
        .await?;
    let mut stdout = std::io::stdout();
    while let Some(update) = updates.next().await {
        write!(stdout, "{}", update?.text())?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// Create `JokerAgent`, ask for a joke, then delete the agent.
pub async fn joker(config: &AgentkitConfig, mode: RunMode, cancel: &CancelToken) -> Result<()> {
    let agents = project_agents(config)?;
    let model = config.require_deployment_name()?;
    let agent = agents
        .create_ai_agent(
            "JokerAgent",
            model,
            "You are good at telling jokes.",
            None,
            Vec::new(),
            cancel,
        )
        .await?;
    info!(agent = %agent.id(), "agent created");

    let result = run_agent(&agent, "Tell me a joke about a pirate.", None, mode, cancel).await;
    agents.delete_agent("JokerAgent", cancel).await?;
    result
}

/// Run `prompt` against an agent that already exists.
pub async fn existing(
    config: &AgentkitConfig,
    name: &str,
    prompt: &str,
    mode: RunMode,
    cancel: &CancelToken,
) -> Result<()> {
    let agent = project_agents(config)?
        .get_ai_agent(name, None, cancel)
        .await?;
    run_agent(&agent, prompt, None, mode, cancel).await
}

/// In-process weather lookup offered to the model.
pub fn weather_tool() -> AITool {
    function(
        "get_weather",
        "Get the weather for a given location.",
        json!({
            "type": "object",
            "properties": {"location": {"type": "string", "description": "The location to get the weather for."}},
            "required": ["location"]
        }),
        |args: Value| async move { Ok(json!(describe_weather(args["location"].as_str()))) },
    )
}

fn describe_weather(location: Option<&str>) -> String {
    format!(
        "The weather in {} is cloudy with a high of 15°C.",
        location.unwrap_or("an unknown place")
    )
}

/// Create `WeatherAgent` with an in-process tool, ask, then delete.
pub async fn weather(
    config: &AgentkitConfig,
    location: &str,
    mode: RunMode,
    cancel: &CancelToken,
) -> Result<()> {
    let agents = project_agents(config)?;
    let model = config.require_deployment_name()?;
    let agent = agents
        .create_ai_agent(
            "WeatherAgent",
            model,
            "You are a helpful weather assistant.",
            Some("Answers weather questions"),
            vec![weather_tool()],
            cancel,
        )
        .await?;

    let prompt = format!("What's the weather like in {location}?");
    let result = run_agent(&agent, &prompt, None, mode, cancel).await;
    agents.delete_agent("WeatherAgent", cancel).await?;
    result
}

/// Two turns with a memory provider, the second relying on the first.
pub async fn memory(
    config: &AgentkitConfig,
    scope: &str,
    clear: bool,
    mode: RunMode,
    cancel: &CancelToken,
) -> Result<()> {
    let project = project_config(config)?;
    let credential = project_credential(config)?;
    let model = config.require_deployment_name()?;
    let settings = config.memory.clone().unwrap_or_default();
    let store = config.require_memory_store()?;

    let service = Arc::new(HttpMemoryStoreService::new(project.clone(), credential.clone()));
    let mut options = HostedMemoryProviderOptions::new(store);
    options.max_memories = settings.max_memories;
    options.update_delay = Some(settings.update_delay_secs.unwrap_or(0));
    let provider = Arc::new(HostedMemoryProvider::new(
        service,
        MemoryScope::new(scope)?,
        options,
    )?);
    provider
        .ensure_memory_store(
            MemoryStoreDefinition::new(
                settings.chat_model.as_deref().unwrap_or(model),
                settings
                    .embedding_model
                    .as_deref()
                    .unwrap_or(DEFAULT_EMBEDDING_MODEL),
            ),
            Some("Memories for the agentkit memory sample".into()),
            cancel,
        )
        .await?;
    if clear {
        provider.clear_stored_memories(cancel).await?;
    }

    let chat = OpenAIResponsesClient::new(
        OpenAIConfig::new(project.openai_base_url())
            .with_model(model)
            .with_query_param("api-version", project.api_version.clone()),
        credential,
    );
    let agent = ChatClientAgent::new(
        Arc::new(chat),
        ChatClientAgentOptions::new()
            .with_name("MemoryAgent")
            .with_instructions("You are a friendly assistant that remembers the user."),
    )
    .with_context_provider(provider);

    // Separate threads: the second turn can only know the user through memory.
    run_agent(
        &agent,
        "Hi, my name is Taylor and I love hiking.",
        Some(&agent.get_new_thread()),
        mode,
        cancel,
    )
    .await?;
    run_agent(
        &agent,
        "What do you remember about me?",
        Some(&agent.get_new_thread()),
        mode,
        cancel,
    )
    .await
}

/// Chat with an Anthropic model directly.
pub async fn claude(
    config: &AgentkitConfig,
    prompt: &str,
    token: Option<String>,
    mode: RunMode,
    cancel: &CancelToken,
) -> Result<()> {
    let settings = config.anthropic.clone().unwrap_or_default();
    let credential = match (token, settings.api_key) {
        (Some(token), _) => Credential::token_provider(StaticTokenProvider::new(token)),
        (None, Some(key)) => Credential::api_key(key),
        (None, None) => {
            bail!("missing Anthropic credentials (set ANTHROPIC_API_KEY or pass --token)")
        }
    };
    let mut claude = match settings.base_url {
        Some(url) => ClaudeConfig::new(url),
        None => ClaudeConfig::default(),
    };
    if let Some(model) = settings.model {
        claude = claude.with_model(model);
    }
    if let Some(max) = settings.max_tokens {
        claude = claude.with_max_tokens(max);
    }

    let agent = ChatClientAgent::new(
        Arc::new(AnthropicChatClient::new(claude, credential)),
        ChatClientAgentOptions::new()
            .with_name("ClaudeAgent")
            .with_instructions("You are a concise, helpful assistant."),
    );
    run_agent(&agent, prompt, None, mode, cancel).await
}
