// SPDX-License-Identifier: MIT OR Apache-2.0
//! [`ChatClient`] over the OpenAI Responses API.

use agentkit_core::http::{join_url, send, send_json};
use agentkit_core::{
    CancelToken, ChatClient, ChatClientMetadata, ChatMessage, ChatOptions, ChatResponse,
    ChatResponseStream, Credential, SseStream, sse_events,
};
use agentkit_error::Result;
use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use crate::dialect::{OpenAIConfig, ResponsesRequest, ResponsesResponse};
use crate::lowering::{build_request, from_response};
use crate::streaming::StreamMapper;

/// Chat client that posts to `{base_url}/responses`.
#[derive(Debug, Clone)]
pub struct OpenAIResponsesClient {
    http: reqwest::Client,
    credential: Credential,
    config: OpenAIConfig,
}

impl OpenAIResponsesClient {
    /// Client for `config`, authenticating with `credential`.
    pub fn new(config: OpenAIConfig, credential: Credential) -> Self {
        Self {
            http: reqwest::Client::new(),
            credential,
            config,
        }
    }

    /// Client against the public endpoint with an API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::new(OpenAIConfig::default(), Credential::api_key(api_key))
    }

    /// Use a caller-supplied HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Endpoint configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    async fn post(
        &self,
        body: &ResponsesRequest,
        cancel: &CancelToken,
    ) -> Result<reqwest::RequestBuilder> {
        let url = join_url(&self.config.base_url, "responses");
        let mut request = self.http.post(url).query(&self.config.query_params).json(body);
        for (k, v) in &self.config.headers {
            request = request.header(k, v);
        }
        self.credential.authorize(request, cancel).await
    }
}

#[async_trait]
impl ChatClient for OpenAIResponsesClient {
    fn metadata(&self) -> ChatClientMetadata {
        ChatClientMetadata {
            provider_name: "openai".into(),
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
        let body = build_request(messages, options, &self.config, false)?;
        debug!(
            target: "agentkit.openai",
            model = %body.model,
            items = body.input.len(),
            tools = body.tools.len(),
            "creating response"
        );
        let request = self.post(&body, cancel).await?;
        let resp: ResponsesResponse = send_json(request, cancel).await?;
        debug!(
            target: "agentkit.openai",
            id = %resp.id,
            status = ?resp.status,
            "response received"
        );
        from_response(&resp, body.store())
    }

    async fn get_streaming_response(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancelToken,
    ) -> Result<ChatResponseStream> {
        cancel.check()?;
        let body = build_request(messages, options, &self.config, true)?;
        debug!(target: "agentkit.openai", model = %body.model, "streaming response");
        let request = self.post(&body, cancel).await?;
        let response = send(request, cancel).await?;
        Ok(map_stream(
            sse_events(response),
            StreamMapper::new(body.store()),
            cancel.clone(),
        ))
    }
}

struct StreamState {
    events: SseStream,
    mapper: StreamMapper,
    cancel: CancelToken,
    done: bool,
}

fn map_stream(events: SseStream, mapper: StreamMapper, cancel: CancelToken) -> ChatResponseStream {
    let state = StreamState {
        events,
        mapper,
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
            let frame = match st.events.next().await? {
                Ok(frame) => frame,
                Err(e) => {
                    st.done = true;
                    return Some((Err(e), st));
                }
            };
            match st.mapper.map_sse(&frame) {
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
