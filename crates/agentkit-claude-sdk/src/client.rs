// SPDX-License-Identifier: MIT OR Apache-2.0
//! [`ChatClient`] over the Anthropic Messages API.

use agentkit_core::http::{join_url, send, send_json};
use agentkit_core::{
    CancelToken, ChatClient, ChatClientMetadata, ChatMessage, ChatOptions, ChatResponse,
    ChatResponseStream, Credential, SseStream, sse_events,
};
use agentkit_error::Result;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use crate::dialect::{ClaudeConfig, MessagesResponse};
use crate::lowering::{PreparedRequest, build_request, from_response};
use crate::streaming::ClaudeStreamMapper;

/// Chat client that posts to `{base_url}/messages`.
///
/// API keys travel in `x-api-key`. A [`Credential::Token`] is resolved for
/// every request and sent as `Authorization: Bearer`, which lets the client
/// sit behind a token-exchange gateway.
#[derive(Debug, Clone)]
pub struct AnthropicChatClient {
    http: reqwest::Client,
    credential: Credential,
    config: ClaudeConfig,
}

impl AnthropicChatClient {
    /// Client for `config`, authenticating with `credential`.
    pub fn new(config: ClaudeConfig, credential: Credential) -> Self {
        Self {
            http: reqwest::Client::new(),
            credential,
            config,
        }
    }

    /// Client against the public endpoint with an API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::new(ClaudeConfig::default(), Credential::api_key(api_key))
    }

    /// Use a caller-supplied HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Endpoint configuration.
    pub fn config(&self) -> &ClaudeConfig {
        &self.config
    }

    async fn post(
        &self,
        prepared: &PreparedRequest,
        cancel: &CancelToken,
    ) -> Result<reqwest::RequestBuilder> {
        let url = join_url(&self.config.base_url, "messages");
        let mut request = self
            .http
            .post(url)
            .header("anthropic-version", &self.config.anthropic_version)
            .json(&prepared.body);
        if let Some(betas) = prepared.beta_header() {
            request = request.header("anthropic-beta", betas);
        }
        for (k, v) in &self.config.headers {
            request = request.header(k, v);
        }
        match &self.credential {
            Credential::ApiKey(_) => {
                let key = self.credential.secret(cancel).await?;
                Ok(request.header("x-api-key", key))
            }
            Credential::Token(_) => self.credential.authorize(request, cancel).await,
        }
    }
}

#[async_trait]
impl ChatClient for AnthropicChatClient {
    fn metadata(&self) -> ChatClientMetadata {
        ChatClientMetadata {
            provider_name: "anthropic".into(),
            provider_uri: Some(self.config.base_url.clone()),
            default_model_id: Some(self.config.model.clone()),
        }
    }

    async fn get_response(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancelToken,
    ) -> Result<ChatResponse> {
        cancel.check()?;
        let prepared = build_request(messages, options, &self.config, false)?;
        debug!(
            target: "agentkit.claude",
            model = %prepared.body.model,
            turns = prepared.body.messages.len(),
            tools = prepared.body.tools.len(),
            "creating message"
        );
        let request = self.post(&prepared, cancel).await?;
        let resp: MessagesResponse = send_json(request, cancel).await?;
        debug!(
            target: "agentkit.claude",
            id = %resp.id,
            stop_reason = ?resp.stop_reason,
            "message received"
        );
        Ok(from_response(&resp))
    }

    async fn get_streaming_response(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancelToken,
    ) -> Result<ChatResponseStream> {
        cancel.check()?;
        let prepared = build_request(messages, options, &self.config, true)?;
        debug!(target: "agentkit.claude", model = %prepared.body.model, "streaming message");
        let request = self.post(&prepared, cancel).await?;
        let response = send(request, cancel).await?;
        Ok(map_stream(sse_events(response), cancel.clone()))
    }
}

struct StreamState {
    events: SseStream,
    mapper: ClaudeStreamMapper,
    cancel: CancelToken,
    done: bool,
}

fn map_stream(events: SseStream, cancel: CancelToken) -> ChatResponseStream {
    let state = StreamState {
        events,
        mapper: ClaudeStreamMapper::new(),
        cancel,
        done: false,
    };
    Box::pin(futures::stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }
        loop {
            if let Err(e) = st.cancel.check() {
                st.done = true;
                return Some((Err(e), st));
            }
            let mapped = match st.events.next().await? {
                Ok(frame) => st.mapper.map_sse(&frame),
                Err(e) => Err(e),
            };
            match mapped {
                Ok(Some(update)) => return Some((Ok(update), st)),
                Ok(None) => continue,
                Err(e) => {
                    st.done = true;
                    return Some((Err(e), st));
                }
            }
        }
    }))
}
