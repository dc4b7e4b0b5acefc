// SPDX-License-Identifier: MIT OR Apache-2.0
//! HTTP-level tests for the memory store client and provider.

use std::sync::Arc;

use agentkit_core::{
    CancelToken, ChatClientAgent, ChatClientAgentOptions, Credential, ErrorCode,
    StaticTokenProvider,
};
use agentkit_hosted::ProjectConfig;
use agentkit_memory::{
    HostedMemoryProvider, HostedMemoryProviderOptions, HttpMemoryStoreService, MemoryScope,
    MemoryStoreDefinition, MemoryStoreService,
};
use agentkit_openai_sdk::{OpenAIConfig, OpenAIResponsesClient};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

fn service(server: &MockServer) -> Arc<HttpMemoryStoreService> {
    let config = ProjectConfig::new(format!("{}/api/projects/demo", server.uri()));
    Arc::new(HttpMemoryStoreService::new(
        config,
        Credential::token_provider(StaticTokenProvider::new("project-token")),
    ))
}

fn provider(server: &MockServer) -> HostedMemoryProvider {
    HostedMemoryProvider::new(
        service(server),
        MemoryScope::new("user-42").unwrap(),
        HostedMemoryProviderOptions::new("chat-memories").with_update_delay(0),
    )
    .unwrap()
}

const STORE: &str = "/api/projects/demo/memory_stores";

// ── Provider within an agent turn ───────────────────────────────────

#[tokio::test]
async fn agent_turn_searches_then_updates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{STORE}/chat-memories:search_memories")))
        .and(query_param("api-version", "2025-11-15-preview"))
        .and(header("authorization", "Bearer project-token"))
        .and(body_partial_json(json!({
            "scope": "user-42",
            "items": [{"type": "message", "role": "user", "content": "What should I cook tonight?"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "search_id": "srch_1",
            "memories": [{"memory_item": {"memory_id": "m1", "content": "The user is vegetarian.", "kind": "user_profile"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_1",
            "status": "completed",
            "output": [{
                "type": "message", "id": "msg_1", "role": "assistant",
                "content": [{"type": "output_text", "text": "How about a mushroom risotto?"}]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{STORE}/chat-memories:update_memories")))
        .and(body_partial_json(json!({
            "scope": "user-42",
            "update_delay": 0,
            "items": [
                {"role": "user", "content": "What should I cook tonight?"},
                {"role": "assistant", "content": "How about a mushroom risotto?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "update_id": "upd_1",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let chat = OpenAIResponsesClient::new(
        OpenAIConfig::new(format!("{}/v1", server.uri())).with_model("gpt-4o-mini"),
        Credential::api_key("sk-test"),
    );
    let memory = Arc::new(provider(&server));
    let agent = ChatClientAgent::new(
        Arc::new(chat),
        ChatClientAgentOptions::new().with_instructions("You are a friendly assistant."),
    )
    .with_context_provider(memory.clone());

    let resp = agent
        .run_text("What should I cook tonight?", None, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(resp.text(), "How about a mushroom risotto?");

    let requests = server.received_requests().await.unwrap();
    let model_call: Value = requests
        .iter()
        .find(|r| r.url.path() == "/v1/responses")
        .unwrap()
        .body_json()
        .unwrap();
    let first_text = model_call["input"][0]["content"][0]["text"].as_str().unwrap();
    assert!(first_text.ends_with("The user is vegetarian."));

    let state = memory.state();
    assert_eq!(state.previous_search_id.as_deref(), Some("srch_1"));
    assert_eq!(state.previous_update_id.as_deref(), Some("upd_1"));
}

#[tokio::test]
async fn failing_store_does_not_fail_the_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{STORE}/chat-memories:search_memories")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{STORE}/chat-memories:update_memories")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_1",
            "status": "completed",
            "output": [{"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "Hi!"}]}]
        })))
        .mount(&server)
        .await;

    let chat = OpenAIResponsesClient::new(
        OpenAIConfig::new(format!("{}/v1", server.uri())),
        Credential::api_key("sk-test"),
    );
    let agent = ChatClientAgent::new(Arc::new(chat), ChatClientAgentOptions::new())
        .with_context_provider(Arc::new(provider(&server)));
    let resp = agent
        .run_text("hello", None, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(resp.text(), "Hi!");
}

// ── Scope deletion ──────────────────────────────────────────────────

#[tokio::test]
async fn clearing_an_unknown_scope_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{STORE}/chat-memories:delete_scope")))
        .and(body_partial_json(json!({"scope": "user-42"})))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": {"code": "not_found"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    provider(&server)
        .clear_stored_memories(&CancelToken::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn clearing_surfaces_other_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{STORE}/chat-memories:delete_scope")))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = provider(&server)
        .clear_stored_memories(&CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::VendorStatus);
    assert_eq!(err.http_status(), Some(403));
}

// ── Stores ──────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_creates_missing_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{STORE}/chat-memories")))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(STORE))
        .and(body_partial_json(json!({
            "name": "chat-memories",
            "definition": {"kind": "default", "chat_model": "gpt-4o", "embedding_model": "text-embedding-3-small"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "ms_1", "name": "chat-memories"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = provider(&server)
        .ensure_memory_store(
            MemoryStoreDefinition::new("gpt-4o", "text-embedding-3-small"),
            None,
            &CancelToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(store.id, "ms_1");
}

#[tokio::test]
async fn ensure_tolerates_concurrent_creation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{STORE}/chat-memories")))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{STORE}/chat-memories")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ms_9",
            "name": "chat-memories"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(STORE))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let store = provider(&server)
        .ensure_memory_store(
            MemoryStoreDefinition::new("gpt-4o", "text-embedding-3-small"),
            Some("Chat memories".into()),
            &CancelToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(store.id, "ms_9");
}

#[tokio::test]
async fn blank_store_name_fails_before_any_request() {
    let server = MockServer::start().await;
    let err = service(&server)
        .get_memory_store(" ", &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ArgumentMissing);
    assert!(server.received_requests().await.unwrap().is_empty());
}
