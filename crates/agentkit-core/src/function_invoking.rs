// SPDX-License-Identifier: MIT OR Apache-2.0
//! Chat client wrapper that runs in-process function tools.
//!
//! [`FunctionInvokingChatClient`] forwards requests to an inner client. When
//! the model answers with function calls that name invocable tools from
//! [`ChatOptions::tools`], the calls are executed locally, their results are
//! appended as a tool message and the request is re-issued.

use std::sync::Arc;

use agentkit_error::Result;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::chat::{
    ChatClient, ChatClientMetadata, ChatOptions, ChatResponse, ChatResponseStream,
    ChatResponseUpdate,
};
use crate::json::JsonOptions;
use crate::message::{AIContent, ChatMessage, ChatRole, UsageDetails};
use crate::tool::AITool;

/// Default bound on model round trips per request.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Delegating client that executes function calls.
#[derive(Clone)]
pub struct FunctionInvokingChatClient {
    inner: Arc<dyn ChatClient>,
    max_iterations: usize,
    json: JsonOptions,
}

impl FunctionInvokingChatClient {
    /// Wrap `inner`.
    pub fn new(inner: Arc<dyn ChatClient>) -> Self {
        Self {
            inner,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            json: JsonOptions::default(),
        }
    }

    /// Bound the number of model round trips.
    #[must_use]
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Serialization settings for function results.
    #[must_use]
    pub fn with_json_options(mut self, json: JsonOptions) -> Self {
        self.json = json;
        self
    }

    /// The wrapped client.
    pub fn inner(&self) -> &Arc<dyn ChatClient> {
        &self.inner
    }
}

/// What to do with the calls found in a response.
enum CallPlan {
    /// Nothing to run.
    Done,
    /// At least one call names a declaration-only tool; hand back to the caller.
    Caller,
    /// Run these calls.
    Invoke(Vec<PendingCall>),
}

struct PendingCall {
    call_id: String,
    name: String,
    arguments: Value,
}

fn plan_calls(messages: &[ChatMessage], options: &ChatOptions) -> CallPlan {
    let calls: Vec<PendingCall> = messages
        .iter()
        .flat_map(|m| m.function_calls())
        .map(|(call_id, name, arguments)| PendingCall {
            call_id: call_id.to_owned(),
            name: name.to_owned(),
            arguments: arguments.clone(),
        })
        .collect();
    if calls.is_empty() {
        return CallPlan::Done;
    }
    let hands_back = calls.iter().any(|c| {
        matches!(options.find_tool(&c.name), Some(tool) if !tool.is_invocable())
    });
    if hands_back {
        CallPlan::Caller
    } else {
        CallPlan::Invoke(calls)
    }
}

async fn invoke_calls(
    calls: Vec<PendingCall>,
    options: &ChatOptions,
    json: &JsonOptions,
    cancel: &CancelToken,
) -> Result<ChatMessage> {
    let mut contents = Vec::with_capacity(calls.len());
    for call in calls {
        cancel.check()?;
        let result = match options.find_tool(&call.name).and_then(AITool::as_invocable) {
            Some(function) => {
                debug!(
                    target: "agentkit.core",
                    function = %call.name,
                    call_id = %call.call_id,
                    "invoking function"
                );
                match function.invoke(call.arguments, cancel).await {
                    Ok(value) => json.normalize(value),
                    Err(e) if e.is_cancelled() => return Err(e),
                    Err(e) => {
                        warn!(
                            target: "agentkit.core",
                            function = %call.name,
                            error = %e,
                            "function invocation failed"
                        );
                        Value::String(format!("Error: Function failed. {}", e.message))
                    }
                }
            }
            None => {
                warn!(
                    target: "agentkit.core",
                    function = %call.name,
                    "model requested unknown function"
                );
                Value::String(format!(
                    "Error: Requested function \"{}\" not found.",
                    call.name
                ))
            }
        };
        contents.push(AIContent::FunctionResult {
            call_id: call.call_id,
            result,
        });
    }
    Ok(ChatMessage::with_contents(ChatRole::Tool, contents))
}

/// Messages to send on the next round trip.
fn next_request(
    history: &mut Vec<ChatMessage>,
    options: &mut ChatOptions,
    response: &ChatResponse,
    tool_message: ChatMessage,
) {
    if let Some(conversation) = &response.conversation_id {
        // The service holds the transcript; send only the new results.
        options.conversation_id = Some(conversation.clone());
        history.clear();
    } else {
        history.extend(response.messages.iter().cloned());
    }
    history.push(tool_message);
}

#[async_trait]
impl ChatClient for FunctionInvokingChatClient {
    fn metadata(&self) -> ChatClientMetadata {
        self.inner.metadata()
    }

    async fn get_response(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancelToken,
    ) -> Result<ChatResponse> {
        let mut history = messages.to_vec();
        let mut options = options.clone();
        let mut produced: Vec<ChatMessage> = Vec::new();
        let mut usage: Option<UsageDetails> = None;

        for iteration in 0..self.max_iterations {
            let mut response = self.inner.get_response(&history, &options, cancel).await?;
            if let Some(u) = &response.usage {
                usage.get_or_insert_with(UsageDetails::default).add(u);
            }

            let calls = match plan_calls(&response.messages, &options) {
                CallPlan::Invoke(calls) if iteration + 1 < self.max_iterations => calls,
                CallPlan::Invoke(_) => {
                    debug!(
                        target: "agentkit.core",
                        iterations = self.max_iterations,
                        "function call limit reached"
                    );
                    Vec::new()
                }
                CallPlan::Done | CallPlan::Caller => Vec::new(),
            };
            if calls.is_empty() {
                produced.append(&mut response.messages);
                response.messages = produced;
                response.usage = usage;
                return Ok(response);
            }

            let tool_message = invoke_calls(calls, &options, &self.json, cancel).await?;
            produced.extend(response.messages.iter().cloned());
            produced.push(tool_message.clone());
            next_request(&mut history, &mut options, &response, tool_message);
        }

        // Unreachable while max_iterations >= 1.
        Ok(ChatResponse {
            messages: produced,
            usage,
            ..ChatResponse::default()
        })
    }

    async fn get_streaming_response(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancelToken,
    ) -> Result<ChatResponseStream> {
        let first = self
            .inner
            .get_streaming_response(messages, options, cancel)
            .await?;

        let (tx, rx) = mpsc::channel::<Result<ChatResponseUpdate>>(64);
        let this = self.clone();
        let mut history = messages.to_vec();
        let mut options = options.clone();
        let cancel = cancel.clone();

        tokio::spawn(async move {
            let mut stream = first;
            for iteration in 0..this.max_iterations {
                let mut updates = Vec::new();
                while let Some(item) = stream.next().await {
                    let failed = item.is_err();
                    if let Ok(update) = &item {
                        updates.push(update.clone());
                    }
                    if tx.send(item).await.is_err() || failed {
                        // Consumer went away or the inner stream failed.
                        return;
                    }
                }

                let response = ChatResponse::from_updates(updates);
                let calls = match plan_calls(&response.messages, &options) {
                    CallPlan::Invoke(calls) if iteration + 1 < this.max_iterations => calls,
                    _ => return,
                };
                let tool_message =
                    match invoke_calls(calls, &options, &this.json, &cancel).await {
                        Ok(m) => m,
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    };
                let tool_update = ChatResponseUpdate {
                    role: Some(ChatRole::Tool),
                    contents: tool_message.contents.clone(),
                    ..ChatResponseUpdate::default()
                };
                if tx.send(Ok(tool_update)).await.is_err() {
                    return;
                }
                next_request(&mut history, &mut options, &response, tool_message);
                stream = match this
                    .inner
                    .get_streaming_response(&history, &options, &cancel)
                    .await
                {
                    Ok(s) => s,
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                };
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{FunctionDeclaration, function};
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays canned responses and records what it was sent.
    struct Scripted {
        responses: Mutex<Vec<ChatResponse>>,
        seen: Mutex<Vec<(Vec<ChatMessage>, Option<String>)>>,
    }

    impl Scripted {
        fn new(mut responses: Vec<ChatResponse>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn next(&self, messages: &[ChatMessage], options: &ChatOptions) -> ChatResponse {
            self.seen
                .lock()
                .unwrap()
                .push((messages.to_vec(), options.conversation_id.clone()));
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| ChatResponse::from_message(ChatMessage::assistant("done")))
        }
    }

    #[async_trait]
    impl ChatClient for Scripted {
        fn metadata(&self) -> ChatClientMetadata {
            ChatClientMetadata {
                provider_name: "scripted".into(),
                ..Default::default()
            }
        }

        async fn get_response(
            &self,
            messages: &[ChatMessage],
            options: &ChatOptions,
            _cancel: &CancelToken,
        ) -> Result<ChatResponse> {
            Ok(self.next(messages, options))
        }

        async fn get_streaming_response(
            &self,
            messages: &[ChatMessage],
            options: &ChatOptions,
            _cancel: &CancelToken,
        ) -> Result<ChatResponseStream> {
            let updates = self.next(messages, options).to_updates();
            Ok(Box::pin(futures::stream::iter(updates.into_iter().map(Ok))))
        }
    }

    fn call(name: &str) -> ChatResponse {
        ChatResponse::from_message(ChatMessage::with_contents(
            ChatRole::Assistant,
            vec![AIContent::FunctionCall {
                call_id: "call_1".into(),
                name: name.into(),
                arguments: json!({"location": "Amsterdam"}),
            }],
        ))
    }

    fn weather_tool() -> AITool {
        function(
            "get_weather",
            "Get the weather",
            json!({"type": "object"}),
            |args: Value| async move {
                Ok(json!(format!("Sunny in {}", args["location"].as_str().unwrap_or("?"))))
            },
        )
    }

    #[tokio::test]
    async fn invokes_function_and_reissues() {
        let inner = Scripted::new(vec![
            call("get_weather"),
            ChatResponse::from_message(ChatMessage::assistant("It is sunny.")),
        ]);
        let client = FunctionInvokingChatClient::new(inner.clone());
        let options = ChatOptions::new().with_tool(weather_tool());

        let resp = client
            .get_response(&[ChatMessage::user("weather?")], &options, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(resp.text(), "It is sunny.");
        assert_eq!(resp.messages.len(), 3);
        assert_eq!(resp.messages[1].role, ChatRole::Tool);
        match &resp.messages[1].contents[0] {
            AIContent::FunctionResult { call_id, result } => {
                assert_eq!(call_id, "call_1");
                assert_eq!(result, &json!("Sunny in Amsterdam"));
            }
            other => panic!("unexpected content {other:?}"),
        }
        let seen = inner.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].0.len(), 3);
    }

    #[tokio::test]
    async fn service_conversation_resends_only_results() {
        let mut first = call("get_weather");
        first.conversation_id = Some("resp_1".into());
        let inner = Scripted::new(vec![first]);
        let client = FunctionInvokingChatClient::new(inner.clone());
        let options = ChatOptions::new().with_tool(weather_tool());

        client
            .get_response(&[ChatMessage::user("weather?")], &options, &CancelToken::new())
            .await
            .unwrap();

        let seen = inner.seen.lock().unwrap();
        assert_eq!(seen[1].0.len(), 1);
        assert_eq!(seen[1].0[0].role, ChatRole::Tool);
        assert_eq!(seen[1].1.as_deref(), Some("resp_1"));
    }

    #[tokio::test]
    async fn declaration_only_call_is_returned_to_caller() {
        let inner = Scripted::new(vec![call("lookup")]);
        let client = FunctionInvokingChatClient::new(inner.clone());
        let options = ChatOptions::new()
            .with_tool(FunctionDeclaration::new("lookup", "", json!({})).into());

        let resp = client
            .get_response(&[ChatMessage::user("hi")], &options, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(resp.messages[0].function_calls().count(), 1);
        assert_eq!(inner.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_function_yields_error_result() {
        let inner = Scripted::new(vec![call("missing")]);
        let client = FunctionInvokingChatClient::new(inner);
        let resp = client
            .get_response(&[ChatMessage::user("hi")], &ChatOptions::new(), &CancelToken::new())
            .await
            .unwrap();
        match &resp.messages[1].contents[0] {
            AIContent::FunctionResult { result, .. } => {
                assert!(result.as_str().unwrap().contains("\"missing\" not found"));
            }
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[tokio::test]
    async fn iteration_limit_stops_loop() {
        let inner = Scripted::new(vec![
            call("get_weather"),
            call("get_weather"),
            call("get_weather"),
        ]);
        let client = FunctionInvokingChatClient::new(inner.clone()).with_max_iterations(2);
        let options = ChatOptions::new().with_tool(weather_tool());
        let resp = client
            .get_response(&[ChatMessage::user("hi")], &options, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(inner.seen.lock().unwrap().len(), 2);
        assert_eq!(resp.messages.last().unwrap().function_calls().count(), 1);
    }

    #[tokio::test]
    async fn streaming_runs_the_same_loop() {
        let inner = Scripted::new(vec![
            call("get_weather"),
            ChatResponse::from_message(ChatMessage::assistant("It is sunny.")),
        ]);
        let client = FunctionInvokingChatClient::new(inner);
        let options = ChatOptions::new().with_tool(weather_tool());
        let stream = client
            .get_streaming_response(&[ChatMessage::user("hi")], &options, &CancelToken::new())
            .await
            .unwrap();
        let updates: Vec<_> = stream.map(|u| u.unwrap()).collect().await;
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[1].role, Some(ChatRole::Tool));
        assert_eq!(updates[2].text_content(), "It is sunny.");
    }

    #[tokio::test]
    async fn cancelled_token_stops_invocation() {
        let inner = Scripted::new(vec![call("get_weather")]);
        let client = FunctionInvokingChatClient::new(inner);
        let options = ChatOptions::new().with_tool(weather_tool());
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = client
            .get_response(&[ChatMessage::user("hi")], &options, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
