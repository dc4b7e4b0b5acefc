// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conversion between [`AITool`] and Responses tool descriptors.

use agentkit_core::tool::{
    AITool, CodeInterpreterTool, FileSearchTool, FunctionDeclaration, McpApprovalMode,
    McpServerTool, RawToolDescriptor, SearchContextSize, UserLocation, WebSearchTool,
};
use agentkit_error::{AgentkitError, ErrorCode, Result};
use serde_json::{Value, json};

use crate::dialect::{
    ApproximateLocation, AutoContainer, CodeInterpreterContainer, CodeInterpreterToolSpec,
    FileSearchToolSpec, FunctionTool, McpApprovalSetting, McpRequireApproval, McpToolFilter,
    McpToolSpec, ResponseTool, ResponseToolDescriptor, WebSearchToolSpec,
};
use crate::strict::sanitize_schema;

/// Provider tag for raw descriptors owned by this dialect.
pub const PROVIDER: &str = "openai";

/// Convert one capability into its Responses descriptor.
///
/// Fails with `TOOL_TYPE_UNSUPPORTED` for extension tools and for raw
/// descriptors that belong to another provider.
pub fn to_response_tool(tool: &AITool) -> Result<ResponseToolDescriptor> {
    let known = match tool {
        AITool::Function(f) => function_tool(f.declaration()),
        AITool::Declaration(d) => function_tool(d),
        AITool::WebSearch(w) => ResponseTool::WebSearch(WebSearchToolSpec {
            user_location: w.user_location.as_ref().map(|l| ApproximateLocation {
                kind: "approximate".into(),
                city: l.city.clone(),
                country: l.country.clone(),
                region: l.region.clone(),
                timezone: l.timezone.clone(),
            }),
            search_context_size: w.search_context_size.map(|s| context_size_str(s).to_owned()),
        }),
        AITool::FileSearch(f) => ResponseTool::FileSearch(FileSearchToolSpec {
            vector_store_ids: f.vector_store_ids.clone(),
            max_num_results: f.max_results,
        }),
        AITool::CodeInterpreter(c) => ResponseTool::CodeInterpreter(CodeInterpreterToolSpec {
            container: CodeInterpreterContainer::Auto(AutoContainer::new(c.file_ids.clone())),
        }),
        AITool::McpServer(m) => ResponseTool::Mcp(mcp_tool(m)),
        AITool::Raw(raw) if raw.provider == PROVIDER => {
            return Ok(serde_json::from_value::<ResponseTool>(raw.descriptor.clone())
                .map(ResponseToolDescriptor::Known)
                .unwrap_or_else(|_| ResponseToolDescriptor::Other(raw.descriptor.clone())));
        }
        AITool::Raw(raw) => {
            return Err(unsupported(&format!("{}/{}", raw.provider, tool.name())));
        }
        AITool::Extension(e) => return Err(unsupported(e.type_name())),
    };
    Ok(ResponseToolDescriptor::Known(known))
}

/// Convert a list of capabilities, failing on the first unsupported one.
pub fn to_response_tools(tools: &[AITool]) -> Result<Vec<ResponseToolDescriptor>> {
    tools.iter().map(to_response_tool).collect()
}

/// Convert a Responses descriptor back into a capability.
///
/// Function descriptors become declaration-only tools; unknown descriptors
/// become [`AITool::Raw`] tagged with this provider.
pub fn from_response_tool(descriptor: &ResponseToolDescriptor) -> AITool {
    let tool = match descriptor {
        ResponseToolDescriptor::Known(t) => t,
        ResponseToolDescriptor::Other(v) => {
            return AITool::Raw(RawToolDescriptor {
                provider: PROVIDER.into(),
                descriptor: v.clone(),
            });
        }
    };
    match tool {
        ResponseTool::Function(f) => AITool::Declaration(FunctionDeclaration {
            name: f.name.clone(),
            description: f.description.clone().unwrap_or_default(),
            parameters: f
                .parameters
                .clone()
                .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
            strict: f.strict,
        }),
        ResponseTool::WebSearch(w) => AITool::WebSearch(WebSearchTool {
            user_location: w.user_location.as_ref().map(|l| UserLocation {
                city: l.city.clone(),
                country: l.country.clone(),
                region: l.region.clone(),
                timezone: l.timezone.clone(),
            }),
            search_context_size: w
                .search_context_size
                .as_deref()
                .and_then(parse_context_size),
            max_uses: None,
        }),
        ResponseTool::FileSearch(f) => AITool::FileSearch(FileSearchTool {
            vector_store_ids: f.vector_store_ids.clone(),
            max_results: f.max_num_results,
        }),
        ResponseTool::CodeInterpreter(c) => AITool::CodeInterpreter(CodeInterpreterTool {
            file_ids: match &c.container {
                CodeInterpreterContainer::Auto(auto) => auto.file_ids.clone(),
                CodeInterpreterContainer::Id(_) => Vec::new(),
            },
        }),
        ResponseTool::Mcp(m) => AITool::McpServer(McpServerTool {
            server_name: m.server_label.clone(),
            server_address: m
                .server_url
                .clone()
                .or_else(|| m.connector_id.clone())
                .unwrap_or_default(),
            allowed_tools: m.allowed_tools.clone(),
            approval_mode: m.require_approval.as_ref().map(approval_from_wire),
            headers: m.headers.clone().unwrap_or_default(),
            authorization_token: m.authorization.clone(),
        }),
    }
}

/// Parse a JSON descriptor and convert it.
pub fn from_response_tool_value(value: &Value) -> Result<AITool> {
    let descriptor: ResponseToolDescriptor = serde_json::from_value(value.clone())?;
    Ok(from_response_tool(&descriptor))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn function_tool(decl: &FunctionDeclaration) -> ResponseTool {
    let strict = decl.strict.unwrap_or(false);
    ResponseTool::Function(FunctionTool {
        name: decl.name.clone(),
        description: (!decl.description.is_empty()).then(|| decl.description.clone()),
        parameters: Some(sanitize_schema(&decl.parameters, strict)),
        strict: decl.strict,
    })
}

/// `true` when `address` is an absolute URL with a host.
pub fn is_absolute_url(address: &str) -> bool {
    reqwest::Url::parse(address).is_ok_and(|u| u.has_host())
}

fn mcp_tool(m: &McpServerTool) -> McpToolSpec {
    let (server_url, connector_id) = if is_absolute_url(&m.server_address) {
        (Some(m.server_address.clone()), None)
    } else {
        (None, Some(m.server_address.clone()))
    };
    McpToolSpec {
        server_label: m.server_name.clone(),
        server_url,
        connector_id,
        allowed_tools: m.allowed_tools.clone(),
        require_approval: m.approval_mode.as_ref().map(approval_to_wire),
        headers: (!m.headers.is_empty()).then(|| m.headers.clone()),
        authorization: m.authorization_token.clone(),
    }
}

fn approval_to_wire(mode: &McpApprovalMode) -> McpRequireApproval {
    match mode {
        McpApprovalMode::AlwaysRequire => McpRequireApproval::Mode(McpApprovalSetting::Always),
        McpApprovalMode::NeverRequire => McpRequireApproval::Mode(McpApprovalSetting::Never),
        McpApprovalMode::RequireSpecific {
            always_require,
            never_require,
        } => McpRequireApproval::Filter {
            always: filter(always_require),
            never: filter(never_require),
        },
    }
}

fn filter(names: &[String]) -> Option<McpToolFilter> {
    (!names.is_empty()).then(|| McpToolFilter {
        tool_names: names.to_vec(),
    })
}

fn approval_from_wire(wire: &McpRequireApproval) -> McpApprovalMode {
    match wire {
        McpRequireApproval::Mode(McpApprovalSetting::Always) => McpApprovalMode::AlwaysRequire,
        McpRequireApproval::Mode(McpApprovalSetting::Never) => McpApprovalMode::NeverRequire,
        McpRequireApproval::Filter { always, never } => McpApprovalMode::RequireSpecific {
            always_require: always.as_ref().map(|f| f.tool_names.clone()).unwrap_or_default(),
            never_require: never.as_ref().map(|f| f.tool_names.clone()).unwrap_or_default(),
        },
    }
}

fn context_size_str(size: SearchContextSize) -> &'static str {
    match size {
        SearchContextSize::Low => "low",
        SearchContextSize::Medium => "medium",
        SearchContextSize::High => "high",
    }
}

fn parse_context_size(s: &str) -> Option<SearchContextSize> {
    match s {
        "low" => Some(SearchContextSize::Low),
        "medium" => Some(SearchContextSize::Medium),
        "high" => Some(SearchContextSize::High),
        _ => None,
    }
}

fn unsupported(type_name: &str) -> AgentkitError {
    AgentkitError::new(
        ErrorCode::ToolTypeUnsupported,
        format!("Unsupported tool type '{type_name}'."),
    )
    .with_context("tool_type", type_name)
    .with_context("provider", PROVIDER)
}
