// SPDX-License-Identifier: MIT OR Apache-2.0
//! Client for the hosted agent service.

use agentkit_core::http::{encode_segment as encode, join_url, send, send_json};
use agentkit_core::{CancelToken, Credential};
use agentkit_error::{AgentkitError, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::model::{AgentRecord, AgentVersion, AgentVersionCreationOptions, Conversation};

/// API version sent with every request unless configured otherwise.
pub const DEFAULT_API_VERSION: &str = "2025-11-15-preview";

/// Project endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Project endpoint, e.g. `https://<resource>.services.ai.azure.com/api/projects/<project>`.
    pub endpoint: String,
    /// `api-version` query parameter.
    pub api_version: String,
}

impl ProjectConfig {
    /// Config for `endpoint` with the default API version.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_version: DEFAULT_API_VERSION.into(),
        }
    }

    /// Override the API version.
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Base URL of the project's Responses endpoint.
    pub fn openai_base_url(&self) -> String {
        join_url(&self.endpoint, "openai")
    }
}

/// Operations on agents and conversations.
#[async_trait]
pub trait AgentService: Send + Sync {
    /// Look up an agent; `Ok(None)` when it does not exist.
    async fn get_agent(&self, name: &str, cancel: &CancelToken) -> Result<Option<AgentRecord>>;

    /// Fetch one version of an agent.
    async fn get_agent_version(
        &self,
        name: &str,
        version: &str,
        cancel: &CancelToken,
    ) -> Result<AgentVersion>;

    /// Record a new version, creating the agent when needed.
    async fn create_agent_version(
        &self,
        name: &str,
        options: &AgentVersionCreationOptions,
        cancel: &CancelToken,
    ) -> Result<AgentVersion>;

    /// Delete an agent and all of its versions.
    async fn delete_agent(&self, name: &str, cancel: &CancelToken) -> Result<()>;

    /// Create an empty conversation.
    async fn create_conversation(&self, cancel: &CancelToken) -> Result<Conversation>;

    /// Fetch a conversation.
    async fn get_conversation(&self, id: &str, cancel: &CancelToken) -> Result<Conversation>;
}

/// [`AgentService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAgentService {
    http: reqwest::Client,
    credential: Credential,
    config: ProjectConfig,
}

impl HttpAgentService {
    /// Service for `config`, authenticating with `credential`.
    pub fn new(config: ProjectConfig, credential: Credential) -> Self {
        Self {
            http: reqwest::Client::new(),
            credential,
            config,
        }
    }

    /// Use a caller-supplied HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Endpoint configuration.
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        cancel: &CancelToken,
    ) -> Result<reqwest::RequestBuilder> {
        debug!(target: "agentkit.hosted", %method, path, "agent service call");
        let url = join_url(&self.config.endpoint, path);
        let request = self
            .http
            .request(method, url)
            .query(&[("api-version", self.config.api_version.as_str())]);
        self.credential.authorize(request, cancel).await
    }
}

#[async_trait]
impl AgentService for HttpAgentService {
    async fn get_agent(&self, name: &str, cancel: &CancelToken) -> Result<Option<AgentRecord>> {
        let path = format!("agents/{}", encode(name));
        let request = self.request(reqwest::Method::GET, &path, cancel).await?;
        match send_json::<AgentRecord>(request, cancel).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.http_status() == Some(404) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_agent_version(
        &self,
        name: &str,
        version: &str,
        cancel: &CancelToken,
    ) -> Result<AgentVersion> {
        let path = format!("agents/{}/versions/{}", encode(name), encode(version));
        let request = self.request(reqwest::Method::GET, &path, cancel).await?;
        send_json(request, cancel).await
    }

    async fn create_agent_version(
        &self,
        name: &str,
        options: &AgentVersionCreationOptions,
        cancel: &CancelToken,
    ) -> Result<AgentVersion> {
        let path = format!("agents/{}/versions", encode(name));
        let request = self
            .request(reqwest::Method::POST, &path, cancel)
            .await?
            .json(options);
        send_json(request, cancel).await
    }

    async fn delete_agent(&self, name: &str, cancel: &CancelToken) -> Result<()> {
        let path = format!("agents/{}", encode(name));
        let request = self.request(reqwest::Method::DELETE, &path, cancel).await?;
        send(request, cancel).await.map(|_| ())
    }

    async fn create_conversation(&self, cancel: &CancelToken) -> Result<Conversation> {
        let request = self
            .request(reqwest::Method::POST, "openai/conversations", cancel)
            .await?
            .json(&json!({}));
        send_json(request, cancel).await
    }

    async fn get_conversation(&self, id: &str, cancel: &CancelToken) -> Result<Conversation> {
        if id.trim().is_empty() {
            return Err(AgentkitError::argument_missing("conversation_id"));
        }
        let path = format!("openai/conversations/{}", encode(id));
        let request = self.request(reqwest::Method::GET, &path, cancel).await?;
        send_json(request, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_base_url_sits_under_the_project() {
        let config = ProjectConfig::new("https://res.services.ai.azure.com/api/projects/p1/");
        assert_eq!(
            config.openai_base_url(),
            "https://res.services.ai.azure.com/api/projects/p1/openai"
        );
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
    }
}
