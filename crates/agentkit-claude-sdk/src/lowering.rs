// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lowering between the shared chat representation and the Messages API.

use std::collections::BTreeSet;

use agentkit_core::{
    AIContent, ChatMessage, ChatOptions, ChatResponse, ChatRole, FinishReason, ToolMode,
    UsageDetails,
};
use agentkit_error::Result;
use serde_json::{Value, json};
use tracing::debug;

use crate::dialect::{
    ClaudeConfig, ClaudeMessage, ClaudeUsage, ContentBlock, MessagesRequest, MessagesResponse,
};
use crate::tools::convert_tools;

/// A request body plus the beta flags it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// Body for `POST /messages`.
    pub body: MessagesRequest,
    /// Values for the `anthropic-beta` header.
    pub betas: BTreeSet<&'static str>,
}

impl PreparedRequest {
    /// `anthropic-beta` header value, if any flag is needed.
    pub fn beta_header(&self) -> Option<String> {
        (!self.betas.is_empty()).then(|| self.betas.iter().copied().collect::<Vec<_>>().join(","))
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Split system text out of `messages` and lower the rest into turns.
///
/// Consecutive messages that land on the same wire role are merged, and tool
/// results travel as user-role `tool_result` blocks.
pub fn to_claude_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<ClaudeMessage>) {
    let mut system: Vec<String> = Vec::new();
    let mut turns: Vec<ClaudeMessage> = Vec::new();
    for msg in messages {
        if msg.role == ChatRole::System {
            let text = msg.text();
            if !text.is_empty() {
                system.push(text);
            }
            continue;
        }
        let role = match msg.role {
            ChatRole::Assistant => "assistant",
            _ => "user",
        };
        let blocks: Vec<ContentBlock> = msg.contents.iter().map(to_block).collect();
        if blocks.is_empty() {
            continue;
        }
        match turns.last_mut() {
            Some(last) if last.role == role => last.content.extend(blocks),
            _ => turns.push(ClaudeMessage {
                role: role.to_owned(),
                content: blocks,
            }),
        }
    }
    let system = (!system.is_empty()).then(|| system.join("\n"));
    (system, turns)
}

fn to_block(content: &AIContent) -> ContentBlock {
    match content {
        AIContent::Text { text } => ContentBlock::Text { text: text.clone() },
        AIContent::FunctionCall {
            call_id,
            name,
            arguments,
        } => ContentBlock::ToolUse {
            id: call_id.clone(),
            name: name.clone(),
            input: match arguments {
                Value::Object(_) => arguments.clone(),
                _ => json!({}),
            },
        },
        AIContent::FunctionResult { call_id, result } => ContentBlock::ToolResult {
            tool_use_id: call_id.clone(),
            content: Some(match result {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            is_error: None,
        },
    }
}

fn tool_choice(mode: &ToolMode) -> Value {
    match mode {
        ToolMode::Auto => json!({"type": "auto"}),
        ToolMode::None => json!({"type": "none"}),
        ToolMode::RequireAny => json!({"type": "any"}),
        ToolMode::RequireSpecific(name) => json!({"type": "tool", "name": name}),
    }
}

/// Build a `POST /messages` body.
///
/// Option instructions come before any system messages in `system`.
pub fn build_request(
    messages: &[ChatMessage],
    options: &ChatOptions,
    config: &ClaudeConfig,
    stream: bool,
) -> Result<PreparedRequest> {
    let (system_messages, turns) = to_claude_messages(messages);
    let system = match (options.instructions.clone(), system_messages) {
        (Some(a), Some(b)) => Some(format!("{a}\n{b}")),
        (a, b) => a.or(b),
    };
    if options.conversation_id.is_some() {
        debug!(target: "agentkit.claude", "conversation id ignored; the Messages API is stateless");
    }
    let tools = convert_tools(&options.tools)?;
    let body = MessagesRequest {
        model: options
            .model_id
            .clone()
            .unwrap_or_else(|| config.model.clone()),
        max_tokens: options.max_output_tokens.unwrap_or(config.max_tokens),
        system,
        messages: turns,
        temperature: options.temperature,
        top_p: options.top_p,
        tools: tools.tools,
        tool_choice: options.tool_mode.as_ref().map(tool_choice),
        mcp_servers: tools.mcp_servers,
        stream: stream.then_some(true),
        extra: options.additional_properties.clone(),
    };
    Ok(PreparedRequest {
        body,
        betas: tools.betas,
    })
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Map a stop reason.
pub fn finish_reason(stop_reason: Option<&str>) -> Option<FinishReason> {
    match stop_reason? {
        "end_turn" | "stop_sequence" | "pause_turn" => Some(FinishReason::Stop),
        "max_tokens" => Some(FinishReason::Length),
        "tool_use" => Some(FinishReason::ToolCalls),
        "refusal" => Some(FinishReason::ContentFilter),
        _ => None,
    }
}

/// Usage in the shared representation.
pub fn usage_details(usage: &ClaudeUsage) -> UsageDetails {
    UsageDetails {
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        total_tokens: usage.input_tokens + usage.output_tokens,
    }
}

/// Map a complete response.
pub fn from_response(resp: &MessagesResponse) -> ChatResponse {
    let contents = resp
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(AIContent::text(text.clone())),
            ContentBlock::ToolUse { id, name, input } => Some(AIContent::FunctionCall {
                call_id: id.clone(),
                name: name.clone(),
                arguments: input.clone(),
            }),
            ContentBlock::ToolResult { .. } | ContentBlock::Unknown => None,
        })
        .collect();
    let mut message = ChatMessage::with_contents(ChatRole::Assistant, contents);
    message.message_id = Some(resp.id.clone());
    ChatResponse {
        messages: vec![message],
        response_id: Some(resp.id.clone()),
        conversation_id: None,
        model_id: resp.model.clone(),
        usage: resp.usage.as_ref().map(usage_details),
        finish_reason: finish_reason(resp.stop_reason.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_folds_and_tool_results_are_user_blocks() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("weather in Paris?"),
            ChatMessage::with_contents(
                ChatRole::Assistant,
                vec![AIContent::FunctionCall {
                    call_id: "toolu_1".into(),
                    name: "get_weather".into(),
                    arguments: json!({"city": "Paris"}),
                }],
            ),
            ChatMessage::with_contents(
                ChatRole::Tool,
                vec![AIContent::FunctionResult {
                    call_id: "toolu_1".into(),
                    result: json!("sunny"),
                }],
            ),
            ChatMessage::user("thanks"),
        ];
        let (system, turns) = to_claude_messages(&messages);
        assert_eq!(system.as_deref(), Some("be brief"));
        let v = serde_json::to_value(&turns).unwrap();
        assert_eq!(
            v,
            json!([
                {"role": "user", "content": [{"type": "text", "text": "weather in Paris?"}]},
                {"role": "assistant", "content": [{"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {"city": "Paris"}}]},
                {"role": "user", "content": [
                    {"type": "tool_result", "tool_use_id": "toolu_1", "content": "sunny"},
                    {"type": "text", "text": "thanks"}
                ]}
            ])
        );
    }

    #[test]
    fn instructions_precede_system_messages_and_max_tokens_defaults() {
        let options = ChatOptions::new().with_instructions("pirate voice");
        let prepared = build_request(
            &[ChatMessage::system("be brief"), ChatMessage::user("hi")],
            &options,
            &ClaudeConfig::default().with_max_tokens(512),
            false,
        )
        .unwrap();
        assert_eq!(prepared.body.system.as_deref(), Some("pirate voice\nbe brief"));
        assert_eq!(prepared.body.max_tokens, 512);
        assert!(prepared.beta_header().is_none());

        let capped = build_request(
            &[ChatMessage::user("hi")],
            &ChatOptions::new().with_max_output_tokens(64),
            &ClaudeConfig::default(),
            true,
        )
        .unwrap();
        assert_eq!(capped.body.max_tokens, 64);
        assert_eq!(capped.body.stream, Some(true));
    }

    #[test]
    fn tool_mode_maps_to_tool_choice() {
        let mut options = ChatOptions::new();
        options.tool_mode = Some(ToolMode::RequireAny);
        let prepared = build_request(
            &[ChatMessage::user("x")],
            &options,
            &ClaudeConfig::default(),
            false,
        )
        .unwrap();
        assert_eq!(prepared.body.tool_choice, Some(json!({"type": "any"})));
    }

    #[test]
    fn response_maps_tool_use_and_usage() {
        let resp = MessagesResponse {
            id: "msg_1".into(),
            model: Some("claude-sonnet-4-20250514".into()),
            content: vec![
                ContentBlock::Text {
                    text: "Let me check.".into(),
                },
                ContentBlock::Unknown,
                ContentBlock::ToolUse {
                    id: "toolu_1".into(),
                    name: "get_weather".into(),
                    input: json!({"city": "Paris"}),
                },
            ],
            stop_reason: Some("tool_use".into()),
            usage: Some(ClaudeUsage {
                input_tokens: 10,
                output_tokens: 5,
            }),
            ..Default::default()
        };
        let out = from_response(&resp);
        assert_eq!(out.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(out.usage.unwrap().total_tokens, 15);
        assert_eq!(out.text(), "Let me check.");
        assert_eq!(out.messages[0].function_calls().count(), 1);
        assert!(out.conversation_id.is_none());
    }
}
