// SPDX-License-Identifier: MIT OR Apache-2.0
//! agentkit-openai-sdk
//!
//! The OpenAI Responses dialect: wire types, the strict-mode schema
//! sanitizer, conversion of [`agentkit_core::AITool`] into Responses tool
//! descriptors, and [`OpenAIResponsesClient`], a [`agentkit_core::ChatClient`]
//! for `POST /responses` with and without streaming.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod dialect;
pub mod lowering;
pub mod streaming;
pub mod strict;
pub mod tools;

pub use client::OpenAIResponsesClient;
pub use dialect::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAIConfig, ResponseTool, ResponseToolDescriptor,
    ResponsesRequest, ResponsesResponse,
};
pub use streaming::{ResponseStreamEvent, StreamMapper};
pub use strict::{UNSUPPORTED_KEYWORDS, sanitize_schema};
pub use tools::{from_response_tool, from_response_tool_value, to_response_tool, to_response_tools};
