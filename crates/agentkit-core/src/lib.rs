// SPDX-License-Identifier: MIT OR Apache-2.0
//! agentkit-core
//!
//! The vendor-neutral chat and agent abstraction shared by every agentkit
//! adapter: capability declarations ([`AITool`]), the [`ChatClient`] seam,
//! in-process function invocation, [`ChatClientAgent`] with its threads and
//! context providers, cooperative cancellation, credentials, HTTP helpers and
//! SSE parsing.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod agent;
pub mod auth;
pub mod cancel;
pub mod chat;
pub mod context;
pub mod function_invoking;
pub mod http;
pub mod json;
pub mod message;
pub mod sse;
pub mod tool;

pub use agent::{
    AgentRunResponse, AgentRunResponseStream, AgentRunResponseUpdate, AgentThread,
    ChatClientAgent, ChatClientAgentOptions, ThreadState,
};
pub use auth::{Credential, StaticTokenProvider, TokenProvider};
pub use cancel::{CancelToken, run_cancellable};
pub use chat::{
    ChatClient, ChatClientMetadata, ChatOptions, ChatResponse, ChatResponseStream,
    ChatResponseUpdate, FinishReason, ToolMode,
};
pub use context::{AIContext, AIContextProvider, InvokedContext, InvokingContext};
pub use function_invoking::{DEFAULT_MAX_ITERATIONS, FunctionInvokingChatClient};
pub use json::JsonOptions;
pub use message::{AIContent, ChatMessage, ChatRole, UsageDetails};
pub use sse::{SseEvent, SseParser, SseStream, sse_events};
pub use tool::{
    AIFunction, AITool, CodeInterpreterTool, ExtensionTool, FileSearchTool, FnFunction,
    FunctionDeclaration, McpApprovalMode, McpServerTool, RawToolDescriptor, SearchContextSize,
    UserLocation, WebSearchTool, function,
};

pub use agentkit_error::{AgentkitError, ErrorCode, Result};
