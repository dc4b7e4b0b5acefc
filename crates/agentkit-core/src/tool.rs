// SPDX-License-Identifier: MIT OR Apache-2.0
//! Vendor-neutral capability declarations.
//!
//! [`AITool`] is the closed set of tool kinds an agent may use. Function tools
//! are either invocable ([`AITool::Function`], backed by an [`AIFunction`]) or
//! declaration-only ([`AITool::Declaration`]); every other variant describes a
//! capability executed by the vendor service itself.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use agentkit_error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cancel::{CancelToken, run_cancellable};

// ---------------------------------------------------------------------------
// Function tools
// ---------------------------------------------------------------------------

/// Name, description and JSON parameter schema of a function tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Function name, unique within an agent.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
    /// Request strict-mode schema validation from the vendor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl FunctionDeclaration {
    /// Create a declaration with an explicit schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            strict: None,
        }
    }

    /// Set the strict flag.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }
}

/// A function the agent can call in process.
#[async_trait]
pub trait AIFunction: Send + Sync {
    /// The declaration advertised to the model.
    fn declaration(&self) -> &FunctionDeclaration;

    /// Invoke the function with the model-supplied JSON arguments.
    async fn invoke(&self, arguments: Value, cancel: &CancelToken) -> Result<Value>;
}

/// [`AIFunction`] backed by an async closure.
pub struct FnFunction<F> {
    declaration: FunctionDeclaration,
    handler: F,
}

impl<F> FnFunction<F> {
    /// Wrap `handler` under `declaration`.
    pub fn new(declaration: FunctionDeclaration, handler: F) -> Self {
        Self {
            declaration,
            handler,
        }
    }
}

#[async_trait]
impl<F, Fut> AIFunction for FnFunction<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send,
{
    fn declaration(&self) -> &FunctionDeclaration {
        &self.declaration
    }

    async fn invoke(&self, arguments: Value, cancel: &CancelToken) -> Result<Value> {
        run_cancellable(cancel, (self.handler)(arguments)).await
    }
}

/// Build an invocable function tool from an async closure.
pub fn function<F, Fut>(
    name: impl Into<String>,
    description: impl Into<String>,
    parameters: Value,
    handler: F,
) -> AITool
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    let declaration = FunctionDeclaration::new(name, description, parameters);
    AITool::Function(Arc::new(FnFunction::new(declaration, handler)))
}

// ---------------------------------------------------------------------------
// Hosted tools
// ---------------------------------------------------------------------------

/// Approximate user location hint for web search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLocation {
    /// City name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Two-letter ISO country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Region or state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// IANA timezone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// How much search context the vendor should retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchContextSize {
    /// Least context.
    Low,
    /// Vendor default.
    Medium,
    /// Most context.
    High,
}

/// Server-side web search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchTool {
    /// Location hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_location: Option<UserLocation>,
    /// Context size hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_context_size: Option<SearchContextSize>,
    /// Upper bound on searches per request, where the vendor supports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u32>,
}

/// Server-side search over vector stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSearchTool {
    /// Vector store identifiers to search.
    pub vector_store_ids: Vec<String>,
    /// Cap on returned results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

/// Server-side code execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeInterpreterTool {
    /// Files made available to the execution container.
    #[serde(default)]
    pub file_ids: Vec<String>,
}

/// Approval policy for remote MCP tool calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpApprovalMode {
    /// Every call needs approval.
    AlwaysRequire,
    /// No call needs approval.
    NeverRequire,
    /// Per-tool lists.
    RequireSpecific {
        /// Tools that always need approval.
        always_require: Vec<String>,
        /// Tools that never need approval.
        never_require: Vec<String>,
    },
}

/// A remote tool server reached over the Model Context Protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerTool {
    /// Label the vendor uses for the server.
    pub server_name: String,
    /// Absolute URL or vendor connector id.
    pub server_address: String,
    /// Optional allow-list of sub-tool names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    /// Approval policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_mode: Option<McpApprovalMode>,
    /// Extra headers sent to the server.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Bearer token for the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_token: Option<String>,
}

impl McpServerTool {
    /// Create a server reference.
    pub fn new(server_name: impl Into<String>, server_address: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            server_address: server_address.into(),
            allowed_tools: None,
            approval_mode: None,
            headers: BTreeMap::new(),
            authorization_token: None,
        }
    }
}

/// A vendor descriptor carried through unchanged for its own provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToolDescriptor {
    /// Provider the descriptor belongs to (e.g. `"openai"`).
    pub provider: String,
    /// The vendor JSON.
    pub descriptor: Value,
}

/// A third-party tool kind that no built-in converter knows.
pub trait ExtensionTool: Send + Sync {
    /// Runtime type name, used in "unsupported tool type" errors.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Tool name.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// AITool
// ---------------------------------------------------------------------------

/// Vendor-neutral capability declaration.
#[derive(Clone)]
pub enum AITool {
    /// Invocable function.
    Function(Arc<dyn AIFunction>),
    /// Function known only by its declaration.
    Declaration(FunctionDeclaration),
    /// Web search.
    WebSearch(WebSearchTool),
    /// File search.
    FileSearch(FileSearchTool),
    /// Code execution.
    CodeInterpreter(CodeInterpreterTool),
    /// Remote MCP server.
    McpServer(McpServerTool),
    /// Vendor descriptor passed through.
    Raw(RawToolDescriptor),
    /// Unknown kind.
    Extension(Arc<dyn ExtensionTool>),
}

impl AITool {
    /// Tool name as matched against definitions.
    pub fn name(&self) -> &str {
        match self {
            Self::Function(f) => &f.declaration().name,
            Self::Declaration(d) => &d.name,
            Self::WebSearch(_) => "web_search",
            Self::FileSearch(_) => "file_search",
            Self::CodeInterpreter(_) => "code_interpreter",
            Self::McpServer(m) => &m.server_name,
            Self::Raw(r) => r
                .descriptor
                .get("name")
                .or_else(|| r.descriptor.get("type"))
                .and_then(Value::as_str)
                .unwrap_or("raw"),
            Self::Extension(e) => e.name(),
        }
    }

    /// Short kind label used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Function(_) => "function",
            Self::Declaration(_) => "function_declaration",
            Self::WebSearch(_) => "web_search",
            Self::FileSearch(_) => "file_search",
            Self::CodeInterpreter(_) => "code_interpreter",
            Self::McpServer(_) => "mcp_server",
            Self::Raw(_) => "raw",
            Self::Extension(e) => e.type_name(),
        }
    }

    /// Function declaration for both invocable and declaration-only tools.
    pub fn declaration(&self) -> Option<&FunctionDeclaration> {
        match self {
            Self::Function(f) => Some(f.declaration()),
            Self::Declaration(d) => Some(d),
            _ => None,
        }
    }

    /// The invocable implementation, if this is one.
    pub fn as_invocable(&self) -> Option<&Arc<dyn AIFunction>> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// `true` for [`AITool::Function`].
    pub fn is_invocable(&self) -> bool {
        matches!(self, Self::Function(_))
    }
}

impl From<FunctionDeclaration> for AITool {
    fn from(d: FunctionDeclaration) -> Self {
        Self::Declaration(d)
    }
}

impl fmt::Debug for AITool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(func) => f
                .debug_tuple("Function")
                .field(func.declaration())
                .finish(),
            Self::Declaration(d) => f.debug_tuple("Declaration").field(d).finish(),
            Self::WebSearch(t) => f.debug_tuple("WebSearch").field(t).finish(),
            Self::FileSearch(t) => f.debug_tuple("FileSearch").field(t).finish(),
            Self::CodeInterpreter(t) => f.debug_tuple("CodeInterpreter").field(t).finish(),
            Self::McpServer(t) => f.debug_tuple("McpServer").field(t).finish(),
            Self::Raw(t) => f.debug_tuple("Raw").field(t).finish(),
            Self::Extension(e) => f.debug_tuple("Extension").field(&e.type_name()).finish(),
        }
    }
}

/// Invocable tools compare by declaration; extensions by identity.
impl PartialEq for AITool {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Function(a), Self::Function(b)) => {
                Arc::ptr_eq(a, b) || a.declaration() == b.declaration()
            }
            (Self::Declaration(a), Self::Declaration(b)) => a == b,
            (Self::WebSearch(a), Self::WebSearch(b)) => a == b,
            (Self::FileSearch(a), Self::FileSearch(b)) => a == b,
            (Self::CodeInterpreter(a), Self::CodeInterpreter(b)) => a == b,
            (Self::McpServer(a), Self::McpServer(b)) => a == b,
            (Self::Raw(a), Self::Raw(b)) => a == b,
            (Self::Extension(a), Self::Extension(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
