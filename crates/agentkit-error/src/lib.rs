// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unified error taxonomy with stable error codes for agentkit.
//!
//! Every agentkit error carries an [`ErrorCode`] (a machine-readable, stable
//! string tag), a human-readable message, an optional cause chain, and
//! arbitrary key-value context.  Use the builder returned by
//! [`AgentkitError::new`] to construct errors fluently.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Result alias used across the agentkit crates.
pub type Result<T, E = AgentkitError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A required parameter was missing or malformed.
    Argument,
    /// Agent definition, tool list and overrides disagree.
    Consistency,
    /// A named remote resource does not exist.
    NotFound,
    /// The vendor transport or service failed.
    Vendor,
    /// Best-effort memory operations.
    Memory,
    /// The caller cancelled the operation.
    Cancellation,
    /// In-process tool invocation.
    Tool,
    /// Configuration errors.
    Config,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Argument => "argument",
            Self::Consistency => "consistency",
            Self::NotFound => "not_found",
            Self::Vendor => "vendor",
            Self::Memory => "memory",
            Self::Cancellation => "cancellation",
            Self::Tool => "tool",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Each variant serialises to a `SCREAMING_SNAKE_CASE` string that is
/// guaranteed not to change across patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // -- Argument --
    /// A required parameter was absent or blank.
    ArgumentMissing,
    /// A parameter was present but unusable.
    ArgumentInvalid,

    // -- Consistency --
    /// Tool declarations were embedded in a definition passed to create.
    InlineToolsRejected,
    /// Declared function tools have no invocable implementation.
    InvocableToolsMissing,
    /// A capability cannot be expressed for the target vendor.
    ToolTypeUnsupported,
    /// The agent definition kind cannot back a chat agent.
    DefinitionKindUnsupported,

    // -- NotFound --
    /// No agent with the requested name exists.
    AgentNotFound,
    /// Some other named resource (version, conversation, store) is absent.
    ResourceNotFound,

    // -- Vendor --
    /// The HTTP request could not be sent or its body not read.
    VendorTransport,
    /// The service answered with a non-success status.
    VendorStatus,
    /// The service answered with a body that could not be interpreted.
    VendorResponseInvalid,

    // -- Memory --
    /// A memory search, update or delete call failed.
    MemoryOperationFailed,

    // -- Cancellation --
    /// The operation was cancelled through its cancel token.
    OperationCancelled,

    // -- Tool --
    /// An in-process function tool returned an error.
    ToolInvocationFailed,

    // -- Config --
    /// Configuration file or value is invalid.
    ConfigInvalid,

    // -- Internal --
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ArgumentMissing | Self::ArgumentInvalid => ErrorCategory::Argument,

            Self::InlineToolsRejected
            | Self::InvocableToolsMissing
            | Self::ToolTypeUnsupported
            | Self::DefinitionKindUnsupported => ErrorCategory::Consistency,

            Self::AgentNotFound | Self::ResourceNotFound => ErrorCategory::NotFound,

            Self::VendorTransport | Self::VendorStatus | Self::VendorResponseInvalid => {
                ErrorCategory::Vendor
            }

            Self::MemoryOperationFailed => ErrorCategory::Memory,

            Self::OperationCancelled => ErrorCategory::Cancellation,

            Self::ToolInvocationFailed => ErrorCategory::Tool,

            Self::ConfigInvalid => ErrorCategory::Config,

            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// Stable `&'static str` representation of the code (e.g.
    /// `"INVOCABLE_TOOLS_MISSING"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArgumentMissing => "ARGUMENT_MISSING",
            Self::ArgumentInvalid => "ARGUMENT_INVALID",
            Self::InlineToolsRejected => "INLINE_TOOLS_REJECTED",
            Self::InvocableToolsMissing => "INVOCABLE_TOOLS_MISSING",
            Self::ToolTypeUnsupported => "TOOL_TYPE_UNSUPPORTED",
            Self::DefinitionKindUnsupported => "DEFINITION_KIND_UNSUPPORTED",
            Self::AgentNotFound => "AGENT_NOT_FOUND",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::VendorTransport => "VENDOR_TRANSPORT",
            Self::VendorStatus => "VENDOR_STATUS",
            Self::VendorResponseInvalid => "VENDOR_RESPONSE_INVALID",
            Self::MemoryOperationFailed => "MEMORY_OPERATION_FAILED",
            Self::OperationCancelled => "OPERATION_CANCELLED",
            Self::ToolInvocationFailed => "TOOL_INVOCATION_FAILED",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AgentkitError
// ---------------------------------------------------------------------------

/// Unified agentkit error.
///
/// Carries a stable [`ErrorCode`], a human-readable message, an optional
/// source error for cause-chaining, and arbitrary structured context.
///
/// # Builder usage
///
/// ```
/// use agentkit_error::{AgentkitError, ErrorCode};
///
/// let err = AgentkitError::new(ErrorCode::VendorStatus, "service returned 429")
///     .with_context("status", 429)
///     .with_context("path", "/agents/JokerAgent");
/// assert_eq!(err.http_status(), Some(429));
/// ```
pub struct AgentkitError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl AgentkitError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the entry is silently skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// A required argument was missing or blank.
    pub fn argument_missing(name: &str) -> Self {
        Self::new(
            ErrorCode::ArgumentMissing,
            format!("argument '{name}' must not be empty"),
        )
        .with_context("argument", name)
    }

    /// The operation observed its cancel token.
    pub fn cancelled() -> Self {
        Self::new(ErrorCode::OperationCancelled, "operation was cancelled")
    }

    /// A non-success HTTP status from a vendor service.
    pub fn vendor_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.is_empty() {
            format!("service returned status {status}")
        } else {
            format!("service returned status {status}: {body}")
        };
        Self::new(ErrorCode::VendorStatus, message).with_context("status", status)
    }

    /// The HTTP status recorded on a vendor error, if any.
    pub fn http_status(&self) -> Option<u16> {
        self.context
            .get("status")
            .and_then(|v| v.as_u64())
            .and_then(|v| u16::try_from(v).ok())
    }

    /// `true` for not-found codes and for vendor errors carrying status 404.
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound || self.http_status() == Some(404)
    }

    /// `true` if the operation was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::OperationCancelled
    }
}

impl fmt::Debug for AgentkitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("AgentkitError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for AgentkitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            // Deterministic output thanks to BTreeMap.
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for AgentkitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for AgentkitError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorCode::VendorResponseInvalid, err.to_string()).with_source(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
