// SPDX-License-Identifier: MIT OR Apache-2.0
//! HTTP-level tests for [`AnthropicChatClient`] against a mock server.

use std::sync::Arc;

use agentkit_claude_sdk::{AnthropicChatClient, ClaudeConfig};
use agentkit_core::{
    AITool, CancelToken, ChatClient, ChatMessage, ChatOptions, CodeInterpreterTool, Credential,
    ErrorCode, FunctionInvokingChatClient, StaticTokenProvider, function,
};
use futures::StreamExt;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> ClaudeConfig {
    ClaudeConfig::new(format!("{}/v1", server.uri()))
        .with_model("claude-test")
        .with_max_tokens(1024)
}

fn text_message(id: &str, text: &str) -> Value {
    json!({
        "id": id,
        "type": "message",
        "role": "assistant",
        "model": "claude-test",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 12, "output_tokens": 6}
    })
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn api_key_goes_in_x_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-test",
            "max_tokens": 1024,
            "system": "You are good at telling jokes.",
            "messages": [{"role": "user", "content": [{"type": "text", "text": "Tell me a joke about a pirate."}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_message("msg_1", "Arr!")))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnthropicChatClient::new(config(&server), Credential::api_key("sk-ant-test"));
    let resp = client
        .get_response(
            &[ChatMessage::user("Tell me a joke about a pirate.")],
            &ChatOptions::new().with_instructions("You are good at telling jokes."),
            &CancelToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(resp.text(), "Arr!");
    assert_eq!(resp.usage.unwrap().total_tokens, 18);

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn token_provider_goes_in_bearer_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer exchanged-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_message("msg_1", "ok")))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnthropicChatClient::new(
        config(&server),
        Credential::token_provider(StaticTokenProvider::new("exchanged-token")),
    );
    client
        .get_response(&[ChatMessage::user("hi")], &ChatOptions::new(), &CancelToken::new())
        .await
        .unwrap();
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("x-api-key").is_none());
}

// ── Tools ───────────────────────────────────────────────────────────

#[tokio::test]
async fn server_tools_send_beta_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("anthropic-beta", "code-execution-2025-05-22"))
        .and(body_partial_json(json!({
            "tools": [{"type": "code_execution_20250522", "name": "code_execution"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_message("msg_1", "42")))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnthropicChatClient::new(config(&server), Credential::api_key("k"));
    let options =
        ChatOptions::new().with_tool(AITool::CodeInterpreter(CodeInterpreterTool::default()));
    let resp = client
        .get_response(&[ChatMessage::user("6*7?")], &options, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(resp.text(), "42");
}

#[tokio::test]
async fn function_tool_loop_resends_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "user"},
                {"role": "assistant"},
                {"role": "user", "content": [{"type": "tool_result", "tool_use_id": "toolu_1", "content": "sunny"}]}
            ]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_message("msg_2", "It is sunny.")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "role": "assistant",
            "content": [{"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {"city": "Paris"}}],
            "stop_reason": "tool_use"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let weather = function(
        "get_weather",
        "Weather lookup",
        json!({"type": "object", "properties": {"city": {"type": "string"}}}),
        |_| async { Ok(json!("sunny")) },
    );
    let client = FunctionInvokingChatClient::new(Arc::new(AnthropicChatClient::new(
        config(&server),
        Credential::api_key("k"),
    )));
    let resp = client
        .get_response(
            &[ChatMessage::user("Weather in Paris?")],
            &ChatOptions::new().with_tool(weather),
            &CancelToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(resp.text(), "It is sunny.");
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn overloaded_status_is_vendor_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header_exists("x-api-key"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}
        })))
        .mount(&server)
        .await;

    let client = AnthropicChatClient::new(config(&server), Credential::api_key("k"));
    let err = client
        .get_response(&[ChatMessage::user("hi")], &ChatOptions::new(), &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::VendorStatus);
    assert_eq!(err.http_status(), Some(529));
}

// ── Streaming ───────────────────────────────────────────────────────

#[tokio::test]
async fn streaming_text() {
    let server = MockServer::start().await;
    let frames = [
        json!({"type": "message_start", "message": {"id": "msg_s", "model": "claude-test", "usage": {"input_tokens": 3}}}),
        json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
        json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Yo "}}),
        json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "ho"}}),
        json!({"type": "content_block_stop", "index": 0}),
        json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}, "usage": {"output_tokens": 2}}),
        json!({"type": "message_stop"}),
    ];
    let body: String = frames
        .iter()
        .map(|f| format!("event: {}\r\ndata: {}\r\n\r\n", f["type"].as_str().unwrap_or(""), f))
        .collect();
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let client = AnthropicChatClient::new(config(&server), Credential::api_key("k"));
    let updates: Vec<_> = client
        .get_streaming_response(
            &[ChatMessage::user("sing")],
            &ChatOptions::new(),
            &CancelToken::new(),
        )
        .await
        .unwrap()
        .map(Result::unwrap)
        .collect()
        .await;
    let text: String = updates.iter().map(|u| u.text_content()).collect();
    assert_eq!(text, "Yo ho");
    assert_eq!(updates.last().unwrap().usage.unwrap().total_tokens, 5);
}
