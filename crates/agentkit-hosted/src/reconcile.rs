// SPDX-License-Identifier: MIT OR Apache-2.0
//! Matching declared tools against caller-supplied implementations.

use agentkit_core::AITool;
use agentkit_error::{AgentkitError, ErrorCode, Result};
use agentkit_openai_sdk::tools::from_response_tool;
use agentkit_openai_sdk::{ResponseTool, ResponseToolDescriptor};
use tracing::debug;

/// What counts as a match for a declared function tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolMatchPolicy {
    /// Only invocable tools satisfy a declaration.
    #[default]
    InvocableOnly,
    /// Declaration-only tools are accepted too; their calls are returned to
    /// the caller instead of being run in process.
    AllowDeclarations,
}

impl ToolMatchPolicy {
    fn accepts(self, tool: &AITool) -> bool {
        match self {
            Self::InvocableOnly => tool.is_invocable(),
            Self::AllowDeclarations => tool.declaration().is_some(),
        }
    }
}

fn declared_function(descriptor: &ResponseToolDescriptor) -> Option<&str> {
    match descriptor {
        ResponseToolDescriptor::Known(ResponseTool::Function(f)) => Some(&f.name),
        _ => None,
    }
}

/// Merge `declared` tools with the `supplied` implementations.
///
/// With nothing declared the supplied tools are returned as-is. Otherwise
/// every declared function needs a supplied tool of the same name accepted
/// by `policy`, and every other declared tool is converted directly since
/// the service executes it. Supplied tools the definition does not declare
/// are dropped.
pub fn reconcile_tools(
    declared: &[ResponseToolDescriptor],
    supplied: &[AITool],
    policy: ToolMatchPolicy,
) -> Result<Vec<AITool>> {
    if declared.is_empty() {
        return Ok(supplied.to_vec());
    }
    if supplied.is_empty() && declared.iter().any(|d| declared_function(d).is_some()) {
        return Err(AgentkitError::new(
            ErrorCode::InvocableToolsMissing,
            "in-process tools required but none provided",
        ));
    }

    let mut accepted = Vec::with_capacity(declared.len());
    let mut missing: Vec<&str> = Vec::new();
    for descriptor in declared {
        match declared_function(descriptor) {
            Some(name) => {
                match supplied
                    .iter()
                    .find(|t| t.name() == name && policy.accepts(t))
                {
                    Some(tool) => accepted.push(tool.clone()),
                    None if !missing.contains(&name) => missing.push(name),
                    None => {}
                }
            }
            None => accepted.push(from_response_tool(descriptor)),
        }
    }

    if !missing.is_empty() {
        let list = missing
            .iter()
            .map(|n| format!("'{n}'"))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(AgentkitError::new(
            ErrorCode::InvocableToolsMissing,
            format!("the agent definition requires in-process tools that were not provided: {list}"),
        )
        .with_context("missing_tools", &missing));
    }

    for tool in supplied {
        if !accepted.iter().any(|a| a.name() == tool.name()) {
            debug!(
                target: "agentkit.hosted",
                tool = tool.name(),
                "supplied tool not declared by the definition"
            );
        }
    }
    Ok(accepted)
}
