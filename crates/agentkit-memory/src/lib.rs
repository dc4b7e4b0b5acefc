// SPDX-License-Identifier: MIT OR Apache-2.0
//! agentkit-memory
//!
//! Long-term memory for agents. [`HttpMemoryStoreService`] talks to a hosted
//! memory store; [`HostedMemoryProvider`] plugs it into an agent as an
//! [`agentkit_core::AIContextProvider`], retrieving memories for a
//! [`MemoryScope`] before each turn and submitting the exchange afterwards.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod provider;
pub mod service;

pub use model::{
    CreateMemoryStoreRequest, MemoryInputItem, MemoryItem, MemoryScope, MemoryStore,
    MemoryStoreDefinition, SearchMemoriesRequest, SearchMemoriesResponse, UpdateMemoriesRequest,
    UpdateMemoriesResponse,
};
pub use provider::{
    DEFAULT_CONTEXT_PROMPT, HostedMemoryProvider, HostedMemoryProviderOptions,
    HostedMemoryProviderState,
};
pub use service::{HttpMemoryStoreService, MemoryStoreService};
