// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hooks that enrich an agent turn before the model call and observe it after.

use agentkit_error::{AgentkitError, Result};
use async_trait::async_trait;

use crate::cancel::CancelToken;
use crate::chat::ChatOptions;
use crate::message::ChatMessage;
use crate::tool::AITool;

/// Extra context contributed to a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AIContext {
    /// Instructions appended to the agent's.
    pub instructions: Option<String>,
    /// Messages inserted ahead of the caller's input.
    pub messages: Vec<ChatMessage>,
    /// Tools offered for this turn only.
    pub tools: Vec<AITool>,
}

impl AIContext {
    /// `true` when nothing would be added.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_none() && self.messages.is_empty() && self.tools.is_empty()
    }

    /// Fold this context into a request.
    pub fn apply(self, messages: &mut Vec<ChatMessage>, options: &mut ChatOptions) {
        if let Some(extra) = self.instructions {
            options.instructions = Some(match options.instructions.take() {
                Some(base) => format!("{base}\n{extra}"),
                None => extra,
            });
        }
        if !self.messages.is_empty() {
            let input = std::mem::take(messages);
            *messages = self.messages;
            messages.extend(input);
        }
        options.tools.extend(self.tools);
    }
}

/// Input to [`AIContextProvider::invoking`].
#[derive(Debug, Clone, Copy)]
pub struct InvokingContext<'a> {
    /// New messages supplied by the caller for this turn.
    pub request_messages: &'a [ChatMessage],
}

/// Input to [`AIContextProvider::invoked`].
#[derive(Debug, Clone, Copy)]
pub struct InvokedContext<'a> {
    /// New messages supplied by the caller for this turn.
    pub request_messages: &'a [ChatMessage],
    /// Messages produced by the model; empty on failure.
    pub response_messages: &'a [ChatMessage],
    /// Set when the model call failed.
    pub error: Option<&'a AgentkitError>,
}

/// Agent-turn hook.
#[async_trait]
pub trait AIContextProvider: Send + Sync {
    /// Called before the model is invoked.
    async fn invoking(&self, context: InvokingContext<'_>, cancel: &CancelToken)
    -> Result<AIContext>;

    /// Called after the model call completes or fails.
    async fn invoked(&self, _context: InvokedContext<'_>, _cancel: &CancelToken) -> Result<()> {
        Ok(())
    }
}
