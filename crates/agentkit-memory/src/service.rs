// SPDX-License-Identifier: MIT OR Apache-2.0
//! Client for the memory store API.

use agentkit_core::http::{encode_segment, join_url, send, send_json};
use agentkit_core::{CancelToken, Credential};
use agentkit_error::{AgentkitError, Result};
use agentkit_hosted::ProjectConfig;
use async_trait::async_trait;
use tracing::debug;

use crate::model::{
    CreateMemoryStoreRequest, DeleteScopeRequest, MemoryScope, MemoryStore,
    SearchMemoriesRequest, SearchMemoriesResponse, UpdateMemoriesRequest, UpdateMemoriesResponse,
};

/// Operations on memory stores.
#[async_trait]
pub trait MemoryStoreService: Send + Sync {
    /// Find memories relevant to a conversation.
    async fn search_memories(
        &self,
        store: &str,
        request: &SearchMemoriesRequest,
        cancel: &CancelToken,
    ) -> Result<SearchMemoriesResponse>;

    /// Queue extraction of memories from a conversation.
    async fn update_memories(
        &self,
        store: &str,
        request: &UpdateMemoriesRequest,
        cancel: &CancelToken,
    ) -> Result<UpdateMemoriesResponse>;

    /// Remove every memory in `scope`.
    async fn delete_scope(&self, store: &str, scope: &MemoryScope, cancel: &CancelToken)
    -> Result<()>;

    /// Look up a store; `Ok(None)` when it does not exist.
    async fn get_memory_store(&self, name: &str, cancel: &CancelToken)
    -> Result<Option<MemoryStore>>;

    /// Create a store.
    async fn create_memory_store(
        &self,
        request: &CreateMemoryStoreRequest,
        cancel: &CancelToken,
    ) -> Result<MemoryStore>;
}

/// [`MemoryStoreService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMemoryStoreService {
    http: reqwest::Client,
    credential: Credential,
    config: ProjectConfig,
}

impl HttpMemoryStoreService {
    /// Service for the project at `config`.
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

    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        cancel: &CancelToken,
    ) -> Result<reqwest::RequestBuilder> {
        debug!(target: "agentkit.memory", %method, path, "memory store call");
        let url = join_url(&self.config.endpoint, path);
        let request = self
            .http
            .request(method, url)
            .query(&[("api-version", self.config.api_version.as_str())]);
        self.credential.authorize(request, cancel).await
    }
}

fn action_path(store: &str, action: &str) -> Result<String> {
    if store.trim().is_empty() {
        return Err(AgentkitError::argument_missing("memory_store"));
    }
    Ok(format!("memory_stores/{}:{action}", encode_segment(store)))
}

#[async_trait]
impl MemoryStoreService for HttpMemoryStoreService {
    async fn search_memories(
        &self,
        store: &str,
        request: &SearchMemoriesRequest,
        cancel: &CancelToken,
    ) -> Result<SearchMemoriesResponse> {
        let path = action_path(store, "search_memories")?;
        let builder = self
            .request(reqwest::Method::POST, &path, cancel)
            .await?
            .json(request);
        send_json(builder, cancel).await
    }

    async fn update_memories(
        &self,
        store: &str,
        request: &UpdateMemoriesRequest,
        cancel: &CancelToken,
    ) -> Result<UpdateMemoriesResponse> {
        let path = action_path(store, "update_memories")?;
        let builder = self
            .request(reqwest::Method::POST, &path, cancel)
            .await?
            .json(request);
        send_json(builder, cancel).await
    }

    async fn delete_scope(
        &self,
        store: &str,
        scope: &MemoryScope,
        cancel: &CancelToken,
    ) -> Result<()> {
        let path = action_path(store, "delete_scope")?;
        let builder = self
            .request(reqwest::Method::POST, &path, cancel)
            .await?
            .json(&DeleteScopeRequest {
                scope: scope.clone(),
            });
        send(builder, cancel).await.map(|_| ())
    }

    async fn get_memory_store(
        &self,
        name: &str,
        cancel: &CancelToken,
    ) -> Result<Option<MemoryStore>> {
        if name.trim().is_empty() {
            return Err(AgentkitError::argument_missing("memory_store"));
        }
        let path = format!("memory_stores/{}", encode_segment(name));
        let builder = self.request(reqwest::Method::GET, &path, cancel).await?;
        match send_json(builder, cancel).await {
            Ok(store) => Ok(Some(store)),
            Err(e) if e.http_status() == Some(404) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_memory_store(
        &self,
        request: &CreateMemoryStoreRequest,
        cancel: &CancelToken,
    ) -> Result<MemoryStore> {
        if request.name.trim().is_empty() {
            return Err(AgentkitError::argument_missing("memory_store"));
        }
        let builder = self
            .request(reqwest::Method::POST, "memory_stores", cancel)
            .await?
            .json(request);
        send_json(builder, cancel).await
    }
}
