// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lowering between the shared chat representation and the Responses wire
//! format.

use agentkit_core::{
    AIContent, ChatMessage, ChatOptions, ChatResponse, ChatRole, FinishReason, ToolMode,
    UsageDetails,
};
use agentkit_error::{AgentkitError, ErrorCode, Result};
use serde_json::{Value, json};

use crate::dialect::{
    InputItem, MessageContent, OpenAIConfig, OutputItem, ResponseUsage, ResponsesRequest,
    ResponsesResponse,
};
use crate::tools::to_response_tools;

/// Prefix of ids that chain onto a stored response rather than a conversation.
pub const RESPONSE_ID_PREFIX: &str = "resp_";

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Convert chat messages into input items, preserving content order.
pub fn to_input_items(messages: &[ChatMessage]) -> Vec<InputItem> {
    let mut items = Vec::new();
    for msg in messages {
        let mut text: Vec<MessageContent> = Vec::new();
        for content in &msg.contents {
            match content {
                AIContent::Text { text: t } => text.push(match msg.role {
                    ChatRole::Assistant => MessageContent::OutputText { text: t.clone() },
                    _ => MessageContent::InputText { text: t.clone() },
                }),
                AIContent::FunctionCall {
                    call_id,
                    name,
                    arguments,
                } => {
                    flush_text(&mut items, msg.role, &mut text);
                    items.push(InputItem::FunctionCall {
                        call_id: call_id.clone(),
                        name: name.clone(),
                        arguments: arguments_string(arguments),
                    });
                }
                AIContent::FunctionResult { call_id, result } => {
                    flush_text(&mut items, msg.role, &mut text);
                    items.push(InputItem::FunctionCallOutput {
                        call_id: call_id.clone(),
                        output: result_string(result),
                    });
                }
            }
        }
        flush_text(&mut items, msg.role, &mut text);
    }
    items
}

fn flush_text(items: &mut Vec<InputItem>, role: ChatRole, text: &mut Vec<MessageContent>) {
    if text.is_empty() {
        return;
    }
    let role = match role {
        ChatRole::Tool => ChatRole::User,
        other => other,
    };
    items.push(InputItem::Message {
        role: role.as_str().to_owned(),
        content: std::mem::take(text),
    });
}

fn arguments_string(arguments: &Value) -> String {
    match arguments {
        Value::String(s) => s.clone(),
        Value::Null => "{}".to_owned(),
        other => other.to_string(),
    }
}

fn result_string(result: &Value) -> String {
    match result {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn tool_choice(mode: &ToolMode) -> Value {
    match mode {
        ToolMode::Auto => json!("auto"),
        ToolMode::None => json!("none"),
        ToolMode::RequireAny => json!("required"),
        ToolMode::RequireSpecific(name) => json!({"type": "function", "name": name}),
    }
}

/// Build a `POST /responses` body.
///
/// A conversation id starting with `resp_` is sent as
/// `previous_response_id`; any other id as `conversation`.
pub fn build_request(
    messages: &[ChatMessage],
    options: &ChatOptions,
    config: &OpenAIConfig,
    stream: bool,
) -> Result<ResponsesRequest> {
    let (previous_response_id, conversation) = match options.conversation_id.as_deref() {
        Some(id) if id.starts_with(RESPONSE_ID_PREFIX) => (Some(id.to_owned()), None),
        Some(id) => (None, Some(id.to_owned())),
        None => (None, None),
    };
    Ok(ResponsesRequest {
        model: options
            .model_id
            .clone()
            .unwrap_or_else(|| config.model.clone()),
        input: to_input_items(messages),
        instructions: options.instructions.clone(),
        previous_response_id,
        conversation,
        temperature: options.temperature,
        top_p: options.top_p,
        max_output_tokens: options.max_output_tokens,
        tools: to_response_tools(&options.tools)?,
        tool_choice: options.tool_mode.as_ref().map(tool_choice),
        stream: stream.then_some(true),
        extra: options.additional_properties.clone(),
    })
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Parse model-supplied arguments, keeping the raw text when it is not JSON.
pub fn parse_arguments(arguments: &str) -> Value {
    if arguments.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(arguments).unwrap_or_else(|_| Value::String(arguments.to_owned()))
}

/// Usage in the shared representation.
pub fn usage_details(usage: &ResponseUsage) -> UsageDetails {
    UsageDetails {
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        total_tokens: usage.total_tokens,
    }
}

/// Contents of one output item, or `None` for service-executed items.
pub fn output_contents(item: &OutputItem) -> Option<(Option<String>, Vec<AIContent>)> {
    match item {
        OutputItem::Message { id, content, .. } => Some((
            id.clone(),
            content
                .iter()
                .filter_map(|c| match c {
                    MessageContent::OutputText { text } | MessageContent::InputText { text } => {
                        Some(AIContent::text(text.clone()))
                    }
                    MessageContent::Refusal { refusal } => Some(AIContent::text(refusal.clone())),
                    MessageContent::Unknown => None,
                })
                .collect(),
        )),
        OutputItem::FunctionCall {
            id,
            call_id,
            name,
            arguments,
        } => Some((
            id.clone(),
            vec![AIContent::FunctionCall {
                call_id: call_id.clone(),
                name: name.clone(),
                arguments: parse_arguments(arguments),
            }],
        )),
        OutputItem::Unknown => None,
    }
}

/// Map a terminal status to a finish reason.
pub fn finish_reason(
    status: Option<&str>,
    incomplete_reason: Option<&str>,
    has_calls: bool,
) -> Option<FinishReason> {
    match status {
        Some("incomplete") => Some(match incomplete_reason {
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Length,
        }),
        _ if has_calls => Some(FinishReason::ToolCalls),
        Some("completed") | None => Some(FinishReason::Stop),
        _ => None,
    }
}

/// Error for a `failed` response.
pub fn failed_response_error(resp: &ResponsesResponse) -> AgentkitError {
    let (code, message) = match &resp.error {
        Some(e) => (e.code.clone(), e.message.clone()),
        None => (None, "response failed".to_owned()),
    };
    let mut err = AgentkitError::new(ErrorCode::VendorResponseInvalid, message)
        .with_context("response_id", &resp.id);
    if let Some(code) = code {
        err = err.with_context("vendor_code", code);
    }
    err
}

/// Conversation id for the next turn: the service conversation, else the
/// response id when the response was stored.
pub fn next_conversation_id(resp: &ResponsesResponse, stored: bool) -> Option<String> {
    resp.conversation
        .as_ref()
        .map(|c| c.id.clone())
        .or_else(|| stored.then(|| resp.id.clone()))
}

/// Map a complete response into the shared representation.
pub fn from_response(resp: &ResponsesResponse, stored: bool) -> Result<ChatResponse> {
    if resp.status.as_deref() == Some("failed") {
        return Err(failed_response_error(resp));
    }

    let mut message_id = None;
    let mut contents = Vec::new();
    for item in &resp.output {
        if let Some((id, parts)) = output_contents(item) {
            if message_id.is_none() {
                message_id = id;
            }
            contents.extend(parts);
        }
    }
    let has_calls = contents
        .iter()
        .any(|c| matches!(c, AIContent::FunctionCall { .. }));

    let mut message = ChatMessage::with_contents(ChatRole::Assistant, contents);
    message.message_id = message_id;

    Ok(ChatResponse {
        messages: vec![message],
        response_id: Some(resp.id.clone()),
        conversation_id: next_conversation_id(resp, stored),
        model_id: resp.model.clone(),
        usage: resp.usage.as_ref().map(usage_details),
        finish_reason: finish_reason(
            resp.status.as_deref(),
            resp.incomplete_details
                .as_ref()
                .and_then(|d| d.reason.as_deref()),
            has_calls,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{ConversationRef, IncompleteDetails, ResponseError};
    use agentkit_core::tool::FunctionDeclaration;

    #[test]
    fn roles_and_parts_map_to_input_items() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("weather?"),
            ChatMessage::with_contents(
                ChatRole::Assistant,
                vec![
                    AIContent::text("checking"),
                    AIContent::FunctionCall {
                        call_id: "c1".into(),
                        name: "get_weather".into(),
                        arguments: json!({"city": "Paris"}),
                    },
                ],
            ),
            ChatMessage::with_contents(
                ChatRole::Tool,
                vec![AIContent::FunctionResult {
                    call_id: "c1".into(),
                    result: json!({"temp": 20}),
                }],
            ),
        ];
        let v = serde_json::to_value(to_input_items(&messages)).unwrap();
        assert_eq!(
            v,
            json!([
                {"type": "message", "role": "system", "content": [{"type": "input_text", "text": "be brief"}]},
                {"type": "message", "role": "user", "content": [{"type": "input_text", "text": "weather?"}]},
                {"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "checking"}]},
                {"type": "function_call", "call_id": "c1", "name": "get_weather", "arguments": "{\"city\":\"Paris\"}"},
                {"type": "function_call_output", "call_id": "c1", "output": "{\"temp\":20}"}
            ])
        );
    }

    #[test]
    fn string_results_are_not_requoted() {
        let msg = ChatMessage::with_contents(
            ChatRole::Tool,
            vec![AIContent::FunctionResult {
                call_id: "c".into(),
                result: json!("sunny"),
            }],
        );
        assert_eq!(
            to_input_items(&[msg]),
            vec![InputItem::FunctionCallOutput {
                call_id: "c".into(),
                output: "sunny".into()
            }]
        );
    }

    #[test]
    fn request_fields_follow_options() {
        let options = ChatOptions::new()
            .with_instructions("talk like a pirate")
            .with_temperature(0.5)
            .with_conversation_id("conv_1")
            .with_tool(FunctionDeclaration::new("f", "", json!({"type": "object"})).into())
            .with_additional_property("store", json!(false));
        let mut options = options;
        options.tool_mode = Some(ToolMode::RequireSpecific("f".into()));
        let req = build_request(
            &[ChatMessage::user("hi")],
            &options,
            &OpenAIConfig::default().with_model("gpt-4.1"),
            true,
        )
        .unwrap();
        assert_eq!(req.model, "gpt-4.1");
        assert_eq!(req.conversation.as_deref(), Some("conv_1"));
        assert!(req.previous_response_id.is_none());
        assert_eq!(req.tool_choice, Some(json!({"type": "function", "name": "f"})));
        assert_eq!(req.stream, Some(true));
        assert!(!req.store());
        assert_eq!(req.tools.len(), 1);
    }

    #[test]
    fn response_ids_chain_as_previous_response() {
        let options = ChatOptions::new().with_conversation_id("resp_abc").with_model("o4");
        let req = build_request(&[], &options, &OpenAIConfig::default(), false).unwrap();
        assert_eq!(req.previous_response_id.as_deref(), Some("resp_abc"));
        assert!(req.conversation.is_none());
        assert_eq!(req.model, "o4");
        assert!(req.stream.is_none());
    }

    #[test]
    fn response_with_call_maps_to_tool_calls() {
        let resp = ResponsesResponse {
            id: "resp_1".into(),
            status: Some("completed".into()),
            output: vec![
                OutputItem::Unknown,
                OutputItem::FunctionCall {
                    id: Some("fc_1".into()),
                    call_id: "c1".into(),
                    name: "f".into(),
                    arguments: "{\"x\":1}".into(),
                },
            ],
            usage: Some(ResponseUsage {
                input_tokens: 3,
                output_tokens: 4,
                total_tokens: 7,
            }),
            ..Default::default()
        };
        let out = from_response(&resp, true).unwrap();
        assert_eq!(out.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(out.conversation_id.as_deref(), Some("resp_1"));
        assert_eq!(out.usage.unwrap().total_tokens, 7);
        let calls: Vec<_> = out.messages[0].function_calls().collect();
        assert_eq!(calls, vec![("c1", "f", &json!({"x": 1}))]);
    }

    #[test]
    fn conversation_wins_and_unstored_has_no_id() {
        let mut resp = ResponsesResponse {
            id: "resp_2".into(),
            ..Default::default()
        };
        assert_eq!(from_response(&resp, false).unwrap().conversation_id, None);
        resp.conversation = Some(ConversationRef { id: "conv_9".into() });
        assert_eq!(
            from_response(&resp, false).unwrap().conversation_id.as_deref(),
            Some("conv_9")
        );
    }

    #[test]
    fn incomplete_and_failed_statuses() {
        let resp = ResponsesResponse {
            id: "resp_3".into(),
            status: Some("incomplete".into()),
            incomplete_details: Some(IncompleteDetails {
                reason: Some("max_output_tokens".into()),
            }),
            ..Default::default()
        };
        assert_eq!(
            from_response(&resp, true).unwrap().finish_reason,
            Some(FinishReason::Length)
        );

        let failed = ResponsesResponse {
            id: "resp_4".into(),
            status: Some("failed".into()),
            error: Some(ResponseError {
                code: Some("server_error".into()),
                message: "boom".into(),
            }),
            ..Default::default()
        };
        let err = from_response(&failed, true).unwrap_err();
        assert_eq!(err.code, ErrorCode::VendorResponseInvalid);
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn malformed_arguments_are_kept_as_text() {
        assert_eq!(parse_arguments("not json"), json!("not json"));
        assert_eq!(parse_arguments(""), json!({}));
    }
}
