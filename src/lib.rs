// SPDX-License-Identifier: MIT OR Apache-2.0
//! agentkit
//!
//! Facade over the agentkit workspace. The vendor-neutral abstraction from
//! `agentkit-core` is re-exported at the root; each adapter lives under its
//! own module.
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentkit::openai::{OpenAIConfig, OpenAIResponsesClient};
//! use agentkit::{CancelToken, ChatClientAgent, ChatClientAgentOptions, Credential};
//!
//! # async fn demo() -> agentkit::Result<()> {
//! let client = OpenAIResponsesClient::new(
//!     OpenAIConfig::default().with_model("gpt-4o-mini"),
//!     Credential::api_key("sk-..."),
//! );
//! let agent = ChatClientAgent::new(
//!     Arc::new(client),
//!     ChatClientAgentOptions::new().with_instructions("You are good at telling jokes."),
//! );
//! let reply = agent
//!     .run_text("Tell me a joke about a pirate.", None, &CancelToken::new())
//!     .await?;
//! println!("{}", reply.text());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub use agentkit_core::*;

/// Anthropic Messages dialect and chat client.
pub use agentkit_claude_sdk as claude;
/// TOML configuration with environment overrides.
pub use agentkit_config as config;
/// Error taxonomy.
pub use agentkit_error as error;
/// Hosted agent service client and agent construction.
pub use agentkit_hosted as hosted;
/// Hosted memory stores and the memory context provider.
pub use agentkit_memory as memory;
/// OpenAI Responses dialect and chat client.
pub use agentkit_openai_sdk as openai;
