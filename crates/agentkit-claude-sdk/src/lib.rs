// SPDX-License-Identifier: MIT OR Apache-2.0
//! agentkit-claude-sdk
//!
//! The Anthropic Messages dialect: wire types, conversion of
//! [`agentkit_core::AITool`] into client tools, server tools and MCP servers,
//! and [`AnthropicChatClient`], a [`agentkit_core::ChatClient`] for
//! `POST /messages` with and without streaming.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod dialect;
pub mod lowering;
pub mod streaming;
pub mod tools;

pub use client::AnthropicChatClient;
pub use dialect::{
    ANTHROPIC_VERSION, ClaudeConfig, ClaudeTool, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS,
    DEFAULT_MODEL, MessagesRequest, MessagesResponse,
};
pub use streaming::ClaudeStreamMapper;
pub use tools::{ToolSet, convert_tools, from_claude_tool, from_mcp_server};
