// SPDX-License-Identifier: MIT OR Apache-2.0
//! Agent runs against an in-memory chat client: thread bookkeeping, context
//! providers, option layering and streaming.

use std::sync::{Arc, Mutex};

use agentkit_core::{
    AIContext, AIContextProvider, AgentThread, AgentkitError, CancelToken, ChatClient,
    ChatClientAgent, ChatClientAgentOptions, ChatClientMetadata, ChatMessage, ChatOptions,
    ChatResponse, ChatResponseStream, ErrorCode, InvokedContext, InvokingContext, JsonOptions,
    Result,
};
use async_trait::async_trait;
use futures::StreamExt;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Default)]
struct EchoClient {
    conversation_id: Option<String>,
    fail: bool,
    requests: Mutex<Vec<(Vec<ChatMessage>, ChatOptions)>>,
}

impl EchoClient {
    fn answer(&self, messages: &[ChatMessage], options: &ChatOptions) -> Result<ChatResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((messages.to_vec(), options.clone()));
        if self.fail {
            return Err(AgentkitError::vendor_status(500, "boom"));
        }
        let last = messages.last().map(ChatMessage::text).unwrap_or_default();
        let mut resp = ChatResponse::from_message(ChatMessage::assistant(format!("echo: {last}")));
        resp.conversation_id = self.conversation_id.clone();
        resp.response_id = Some("resp_42".into());
        Ok(resp)
    }
}

#[async_trait]
impl ChatClient for EchoClient {
    fn metadata(&self) -> ChatClientMetadata {
        ChatClientMetadata {
            provider_name: "echo".into(),
            ..Default::default()
        }
    }

    async fn get_response(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        _cancel: &CancelToken,
    ) -> Result<ChatResponse> {
        self.answer(messages, options)
    }

    async fn get_streaming_response(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        _cancel: &CancelToken,
    ) -> Result<ChatResponseStream> {
        let updates = self.answer(messages, options)?.to_updates();
        Ok(Box::pin(futures::stream::iter(updates.into_iter().map(Ok))))
    }
}

#[derive(Default)]
struct RecordingProvider {
    invoked: Mutex<Vec<(usize, usize, bool)>>,
}

#[async_trait]
impl AIContextProvider for RecordingProvider {
    async fn invoking(
        &self,
        _context: InvokingContext<'_>,
        _cancel: &CancelToken,
    ) -> Result<AIContext> {
        Ok(AIContext {
            messages: vec![ChatMessage::user("## Memories\nlikes pirates")],
            ..Default::default()
        })
    }

    async fn invoked(&self, context: InvokedContext<'_>, _cancel: &CancelToken) -> Result<()> {
        self.invoked.lock().unwrap().push((
            context.request_messages.len(),
            context.response_messages.len(),
            context.error.is_some(),
        ));
        Ok(())
    }
}

fn joker(client: Arc<EchoClient>) -> ChatClientAgent {
    ChatClientAgent::new(
        client,
        ChatClientAgentOptions::new()
            .with_id("JokerAgent:1")
            .with_name("JokerAgent")
            .with_instructions("You are good at telling jokes."),
    )
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_text_returns_response_and_sends_instructions() {
    let client = Arc::new(EchoClient::default());
    let agent = joker(client.clone());

    let resp = agent
        .run_text("Tell me a joke about a pirate.", None, &CancelToken::new())
        .await
        .unwrap();

    assert!(!resp.text().is_empty());
    assert_eq!(resp.agent_id, "JokerAgent:1");
    assert_eq!(resp.messages[0].author_name.as_deref(), Some("JokerAgent"));
    let requests = client.requests.lock().unwrap();
    assert_eq!(
        requests[0].1.instructions.as_deref(),
        Some("You are good at telling jokes.")
    );
}

#[tokio::test]
async fn local_thread_accumulates_history() {
    let client = Arc::new(EchoClient::default());
    let agent = joker(client.clone());
    let thread = agent.get_new_thread();
    let cancel = CancelToken::new();

    agent.run_text("one", Some(&thread), &cancel).await.unwrap();
    agent.run_text("two", Some(&thread), &cancel).await.unwrap();

    assert_eq!(thread.messages().len(), 4);
    let requests = client.requests.lock().unwrap();
    assert_eq!(requests[1].0.len(), 3);
}

#[tokio::test]
async fn service_thread_keeps_only_conversation_id() {
    let client = Arc::new(EchoClient {
        conversation_id: Some("conv_1".into()),
        ..Default::default()
    });
    let agent = joker(client.clone());
    let thread = AgentThread::new();
    let cancel = CancelToken::new();

    agent.run_text("one", Some(&thread), &cancel).await.unwrap();
    agent.run_text("two", Some(&thread), &cancel).await.unwrap();

    assert_eq!(thread.conversation_id().as_deref(), Some("conv_1"));
    assert!(thread.messages().is_empty());
    let requests = client.requests.lock().unwrap();
    assert_eq!(requests[1].0.len(), 1);
    assert_eq!(requests[1].1.conversation_id.as_deref(), Some("conv_1"));
}

#[tokio::test]
async fn thread_survives_serialization() {
    let json = JsonOptions::new().drop_nulls(true);
    let thread = AgentThread::with_conversation_id("conv_9");
    let value = thread.serialize(&json).unwrap();
    let back = AgentThread::deserialize(value, &json).unwrap();
    assert_eq!(back.snapshot(), thread.snapshot());
}

#[tokio::test]
async fn run_options_override_agent_defaults() {
    let client = Arc::new(EchoClient::default());
    let agent = ChatClientAgent::new(
        client.clone(),
        ChatClientAgentOptions::new()
            .with_chat_options(ChatOptions::new().with_model("gpt-4o").with_temperature(0.1)),
    );
    let run = ChatOptions::new().with_temperature(0.7);
    agent
        .run(vec![ChatMessage::user("hi")], None, Some(&run), &CancelToken::new())
        .await
        .unwrap();

    let requests = client.requests.lock().unwrap();
    assert_eq!(requests[0].1.model_id.as_deref(), Some("gpt-4o"));
    assert_eq!(requests[0].1.temperature, Some(0.7));
}

#[tokio::test]
async fn generated_id_when_absent() {
    let agent = ChatClientAgent::new(Arc::new(EchoClient::default()), Default::default());
    assert!(!agent.id().is_empty());
}

// ---------------------------------------------------------------------------
// Context providers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provider_context_is_prepended_and_notified() {
    let client = Arc::new(EchoClient::default());
    let provider = Arc::new(RecordingProvider::default());
    let agent = joker(client.clone()).with_context_provider(provider.clone());

    agent.run_text("hi", None, &CancelToken::new()).await.unwrap();

    let requests = client.requests.lock().unwrap();
    assert!(requests[0].0[0].text().contains("likes pirates"));
    assert_eq!(requests[0].0[1].text(), "hi");
    assert_eq!(provider.invoked.lock().unwrap().as_slice(), &[(1, 1, false)]);
}

#[tokio::test]
async fn provider_sees_failures() {
    let client = Arc::new(EchoClient {
        fail: true,
        ..Default::default()
    });
    let provider = Arc::new(RecordingProvider::default());
    let agent = joker(client).with_context_provider(provider.clone());

    let err = agent
        .run_text("hi", None, &CancelToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::VendorStatus);
    assert_eq!(provider.invoked.lock().unwrap().as_slice(), &[(1, 0, true)]);
}

#[tokio::test]
async fn cancelled_run_fails_before_request() {
    let client = Arc::new(EchoClient::default());
    let agent = joker(client.clone());
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = agent.run_text("hi", None, &cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(client.requests.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

#[tokio::test]
async fn streaming_updates_thread_after_completion() {
    let client = Arc::new(EchoClient::default());
    let agent = joker(client);
    let thread = agent.get_new_thread();

    let stream = agent
        .run_streaming(
            vec![ChatMessage::user("ahoy")],
            Some(&thread),
            None,
            &CancelToken::new(),
        )
        .await
        .unwrap();
    let text: String = stream.map(|u| u.unwrap().text()).collect::<Vec<_>>().await.concat();

    assert_eq!(text, "echo: ahoy");
    // The writer task records the turn after the last fragment is sent.
    for _ in 0..50 {
        if thread.messages().len() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(thread.messages().len(), 2);
}
