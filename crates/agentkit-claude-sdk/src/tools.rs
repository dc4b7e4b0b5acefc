// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conversion of [`AITool`] into Messages API tools and MCP servers.

use std::collections::BTreeSet;

use agentkit_core::tool::{
    AITool, CodeInterpreterTool, FunctionDeclaration, McpServerTool, RawToolDescriptor,
    UserLocation, WebSearchTool,
};
use agentkit_error::{AgentkitError, ErrorCode, Result};
use serde_json::json;
use tracing::debug;

use crate::dialect::{
    BETA_CODE_EXECUTION, BETA_MCP_CLIENT, CODE_EXECUTION_TOOL_TYPE, ClaudeTool, ClaudeUserLocation,
    CustomTool, McpServerDefinition, McpToolConfiguration, ServerTool, WEB_SEARCH_TOOL_TYPE,
};

/// Provider tag for raw descriptors owned by this dialect.
pub const PROVIDER: &str = "anthropic";

/// Request members produced from a tool list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolSet {
    /// Entries of `tools`.
    pub tools: Vec<ClaudeTool>,
    /// Entries of `mcp_servers`.
    pub mcp_servers: Vec<McpServerDefinition>,
    /// Beta flags the request must send.
    pub betas: BTreeSet<&'static str>,
}

/// Convert a tool list, failing on the first unsupported entry.
pub fn convert_tools(tools: &[AITool]) -> Result<ToolSet> {
    let mut set = ToolSet::default();
    for tool in tools {
        match tool {
            AITool::Function(f) => set.tools.push(custom_tool(f.declaration())),
            AITool::Declaration(d) => set.tools.push(custom_tool(d)),
            AITool::WebSearch(w) => set.tools.push(ClaudeTool::Server(web_search(w))),
            AITool::CodeInterpreter(c) => {
                if !c.file_ids.is_empty() {
                    debug!(
                        target: "agentkit.claude",
                        files = c.file_ids.len(),
                        "code execution file ids are not forwarded"
                    );
                }
                set.tools.push(ClaudeTool::Server(ServerTool {
                    kind: CODE_EXECUTION_TOOL_TYPE.into(),
                    name: "code_execution".into(),
                    max_uses: None,
                    user_location: None,
                }));
                set.betas.insert(BETA_CODE_EXECUTION);
            }
            AITool::McpServer(m) => {
                set.mcp_servers.push(mcp_server(m)?);
                set.betas.insert(BETA_MCP_CLIENT);
            }
            AITool::Raw(raw) if raw.provider == PROVIDER => {
                set.tools.push(ClaudeTool::Other(raw.descriptor.clone()));
            }
            AITool::Raw(raw) => {
                return Err(unsupported(&format!("{}/{}", raw.provider, tool.name())));
            }
            AITool::FileSearch(_) => return Err(unsupported("file_search")),
            AITool::Extension(e) => return Err(unsupported(e.type_name())),
        }
    }
    Ok(set)
}

/// Convert a `tools` entry back into a capability.
pub fn from_claude_tool(tool: &ClaudeTool) -> AITool {
    match tool {
        ClaudeTool::Custom(c) => AITool::Declaration(FunctionDeclaration {
            name: c.name.clone(),
            description: c.description.clone().unwrap_or_default(),
            parameters: c.input_schema.clone(),
            strict: None,
        }),
        ClaudeTool::Server(s) if s.kind.starts_with("web_search_") => {
            AITool::WebSearch(WebSearchTool {
                user_location: s.user_location.as_ref().map(|l| UserLocation {
                    city: l.city.clone(),
                    country: l.country.clone(),
                    region: l.region.clone(),
                    timezone: l.timezone.clone(),
                }),
                search_context_size: None,
                max_uses: s.max_uses,
            })
        }
        ClaudeTool::Server(s) if s.kind.starts_with("code_execution_") => {
            AITool::CodeInterpreter(CodeInterpreterTool::default())
        }
        ClaudeTool::Server(s) => AITool::Raw(RawToolDescriptor {
            provider: PROVIDER.into(),
            descriptor: serde_json::to_value(s).unwrap_or_else(|_| json!({"type": s.kind})),
        }),
        ClaudeTool::Other(v) => AITool::Raw(RawToolDescriptor {
            provider: PROVIDER.into(),
            descriptor: v.clone(),
        }),
    }
}

/// Convert an `mcp_servers` entry back into a capability.
pub fn from_mcp_server(def: &McpServerDefinition) -> AITool {
    let mut tool = McpServerTool::new(&def.name, &def.url);
    tool.authorization_token = def.authorization_token.clone();
    tool.allowed_tools = def
        .tool_configuration
        .as_ref()
        .and_then(|c| c.allowed_tools.clone());
    AITool::McpServer(tool)
}

fn custom_tool(decl: &FunctionDeclaration) -> ClaudeTool {
    ClaudeTool::Custom(CustomTool {
        name: decl.name.clone(),
        description: (!decl.description.is_empty()).then(|| decl.description.clone()),
        input_schema: decl.parameters.clone(),
    })
}

fn web_search(w: &WebSearchTool) -> ServerTool {
    ServerTool {
        kind: WEB_SEARCH_TOOL_TYPE.into(),
        name: "web_search".into(),
        max_uses: w.max_uses,
        user_location: w.user_location.as_ref().map(|l| ClaudeUserLocation {
            kind: "approximate".into(),
            city: l.city.clone(),
            region: l.region.clone(),
            country: l.country.clone(),
            timezone: l.timezone.clone(),
        }),
    }
}

fn mcp_server(m: &McpServerTool) -> Result<McpServerDefinition> {
    let is_url = reqwest::Url::parse(&m.server_address).is_ok_and(|u| u.has_host());
    if !is_url {
        return Err(AgentkitError::new(
            ErrorCode::ArgumentInvalid,
            format!(
                "MCP server '{}' needs an absolute URL, got '{}'.",
                m.server_name, m.server_address
            ),
        )
        .with_context("provider", PROVIDER));
    }
    if m.approval_mode.is_some() || !m.headers.is_empty() {
        debug!(
            target: "agentkit.claude",
            server = %m.server_name,
            "MCP approval mode and headers are not forwarded"
        );
    }
    Ok(McpServerDefinition {
        kind: "url".into(),
        url: m.server_address.clone(),
        name: m.server_name.clone(),
        authorization_token: m.authorization_token.clone(),
        tool_configuration: m.allowed_tools.as_ref().map(|allowed| McpToolConfiguration {
            enabled: true,
            allowed_tools: Some(allowed.clone()),
        }),
    })
}

fn unsupported(type_name: &str) -> AgentkitError {
    AgentkitError::new(
        ErrorCode::ToolTypeUnsupported,
        format!("Unsupported tool type '{type_name}'."),
    )
    .with_context("tool_type", type_name)
    .with_context("provider", PROVIDER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_core::tool::{FileSearchTool, function};
    use serde_json::Value;

    #[test]
    fn function_becomes_custom_tool() {
        let tool = function(
            "get_weather",
            "Get the weather",
            json!({"type": "object", "properties": {"city": {"type": "string"}}}),
            |_| async { Ok(Value::Null) },
        );
        let set = convert_tools(&[tool]).unwrap();
        assert_eq!(
            serde_json::to_value(&set.tools).unwrap(),
            json!([{
                "name": "get_weather",
                "description": "Get the weather",
                "input_schema": {"type": "object", "properties": {"city": {"type": "string"}}}
            }])
        );
        assert!(set.betas.is_empty());
    }

    #[test]
    fn hosted_tools_add_betas() {
        let mut mcp = McpServerTool::new("docs", "https://mcp.example.com/sse");
        mcp.allowed_tools = Some(vec!["search".into()]);
        mcp.authorization_token = Some("tok".into());
        let set = convert_tools(&[
            AITool::WebSearch(WebSearchTool {
                max_uses: Some(2),
                ..Default::default()
            }),
            AITool::CodeInterpreter(CodeInterpreterTool::default()),
            AITool::McpServer(mcp),
        ])
        .unwrap();
        let tools = serde_json::to_value(&set.tools).unwrap();
        assert_eq!(
            tools[0],
            json!({"type": "web_search_20250305", "name": "web_search", "max_uses": 2})
        );
        assert_eq!(tools[1], json!({"type": "code_execution_20250522", "name": "code_execution"}));
        assert_eq!(
            serde_json::to_value(&set.mcp_servers).unwrap(),
            json!([{
                "type": "url", "url": "https://mcp.example.com/sse", "name": "docs",
                "authorization_token": "tok",
                "tool_configuration": {"enabled": true, "allowed_tools": ["search"]}
            }])
        );
        assert_eq!(
            set.betas.into_iter().collect::<Vec<_>>(),
            vec![BETA_CODE_EXECUTION, BETA_MCP_CLIENT]
        );
    }

    #[test]
    fn unsupported_kinds() {
        let err = convert_tools(&[AITool::FileSearch(FileSearchTool::default())]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ToolTypeUnsupported);
        assert!(err.message.contains("file_search"));

        let foreign = AITool::Raw(RawToolDescriptor {
            provider: "openai".into(),
            descriptor: json!({"type": "image_generation"}),
        });
        assert_eq!(
            convert_tools(&[foreign]).unwrap_err().code,
            ErrorCode::ToolTypeUnsupported
        );

        let connector = AITool::McpServer(McpServerTool::new("dropbox", "connector_dropbox"));
        assert_eq!(
            convert_tools(&[connector]).unwrap_err().code,
            ErrorCode::ArgumentInvalid
        );
    }

    #[test]
    fn own_raw_descriptor_passes_through() {
        let raw = AITool::Raw(RawToolDescriptor {
            provider: PROVIDER.into(),
            descriptor: json!({"type": "bash_20250124", "name": "bash"}),
        });
        let set = convert_tools(&[raw]).unwrap();
        assert_eq!(
            serde_json::to_value(&set.tools[0]).unwrap(),
            json!({"type": "bash_20250124", "name": "bash"})
        );
    }

    #[test]
    fn round_trip_preserves_names() {
        let tools = vec![
            AITool::Declaration(FunctionDeclaration::new(
                "lookup",
                "Find",
                json!({"type": "object"}),
            )),
            AITool::WebSearch(WebSearchTool {
                max_uses: Some(1),
                ..Default::default()
            }),
            AITool::CodeInterpreter(CodeInterpreterTool::default()),
        ];
        let set = convert_tools(&tools).unwrap();
        let back: Vec<AITool> = set.tools.iter().map(from_claude_tool).collect();
        assert_eq!(back, tools);

        let mcp = McpServerTool::new("docs", "https://mcp.example.com/sse");
        let set = convert_tools(&[AITool::McpServer(mcp.clone())]).unwrap();
        assert_eq!(from_mcp_server(&set.mcp_servers[0]), AITool::McpServer(mcp));
    }
}
