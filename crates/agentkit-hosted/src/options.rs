// SPDX-License-Identifier: MIT OR Apache-2.0
//! Effective agent options from a recorded version and caller overrides.

use agentkit_core::{ChatClientAgentOptions, ChatOptions};
use agentkit_error::Result;

use crate::model::{AgentDefinition, AgentVersion};
use crate::reconcile::{ToolMatchPolicy, reconcile_tools};

/// Identifier used when the caller does not supply one.
pub fn default_agent_id(version: &AgentVersion) -> String {
    format!("{}:{}", version.name, version.version)
}

/// Layer `overrides` over the values recorded in `version`.
///
/// Tools supplied in the override chat options are reconciled against the
/// definition's declared tools with `policy`. Temperature and top-p fall back
/// to the prompt definition.
pub fn build_agent_options(
    version: &AgentVersion,
    overrides: Option<&ChatClientAgentOptions>,
    policy: ToolMatchPolicy,
) -> Result<ChatClientAgentOptions> {
    let base = overrides.cloned().unwrap_or_default();
    let mut chat = base.chat_options.unwrap_or_else(ChatOptions::new);
    chat.tools = reconcile_tools(version.definition.tools(), &chat.tools, policy)?;
    if let AgentDefinition::Prompt(prompt) = &version.definition {
        chat.temperature = chat.temperature.or(prompt.temperature);
        chat.top_p = chat.top_p.or(prompt.top_p);
    }

    Ok(ChatClientAgentOptions {
        id: base.id.or_else(|| Some(default_agent_id(version))),
        name: base.name.or_else(|| Some(version.name.clone())),
        description: base.description.or_else(|| version.description.clone()),
        instructions: base
            .instructions
            .or_else(|| version.definition.instructions().map(str::to_owned)),
        chat_options: Some(chat),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PromptAgentDefinition;
    use agentkit_core::function;
    use serde_json::json;

    fn version() -> AgentVersion {
        let mut def = PromptAgentDefinition::new("gpt-4o")
            .with_instructions("Recorded instructions.")
            .with_temperature(0.3);
        def.top_p = Some(0.9);
        def.tools = serde_json::from_value(json!([{"type": "function", "name": "get_weather"}]))
            .unwrap();
        AgentVersion {
            id: "WeatherAgent:4".into(),
            name: "WeatherAgent".into(),
            version: "4".into(),
            description: Some("Reports the weather.".into()),
            created_at: 0,
            metadata: Default::default(),
            definition: AgentDefinition::Prompt(def),
        }
    }

    fn weather() -> agentkit_core::AITool {
        function("get_weather", "", json!({"type": "object"}), |_| async { Ok(json!("sunny")) })
    }

    #[test]
    fn definition_values_fill_gaps() {
        let overrides = ChatClientAgentOptions::new()
            .with_chat_options(ChatOptions::new().with_tool(weather()));
        let out = build_agent_options(&version(), Some(&overrides), ToolMatchPolicy::default())
            .unwrap();
        assert_eq!(out.id.as_deref(), Some("WeatherAgent:4"));
        assert_eq!(out.name.as_deref(), Some("WeatherAgent"));
        assert_eq!(out.description.as_deref(), Some("Reports the weather."));
        assert_eq!(out.instructions.as_deref(), Some("Recorded instructions."));
        let chat = out.chat_options.unwrap();
        assert_eq!(chat.temperature, Some(0.3));
        assert_eq!(chat.top_p, Some(0.9));
        assert_eq!(chat.tools.len(), 1);
    }

    #[test]
    fn overrides_win() {
        let overrides = ChatClientAgentOptions::new()
            .with_id("custom")
            .with_name("Renamed")
            .with_instructions("Be terse.")
            .with_chat_options(ChatOptions::new().with_temperature(1.0).with_tool(weather()));
        let out = build_agent_options(&version(), Some(&overrides), ToolMatchPolicy::default())
            .unwrap();
        assert_eq!(out.id.as_deref(), Some("custom"));
        assert_eq!(out.name.as_deref(), Some("Renamed"));
        assert_eq!(out.instructions.as_deref(), Some("Be terse."));
        assert_eq!(out.chat_options.unwrap().temperature, Some(1.0));
    }

    #[test]
    fn missing_tools_propagate() {
        let err = build_agent_options(&version(), None, ToolMatchPolicy::default()).unwrap_err();
        assert_eq!(err.code, agentkit_error::ErrorCode::InvocableToolsMissing);
    }

    #[test]
    fn workflow_definitions_carry_no_sampling() {
        let mut v = version();
        v.definition = AgentDefinition::Workflow(Default::default());
        let out = build_agent_options(&v, None, ToolMatchPolicy::default()).unwrap();
        assert_eq!(out.instructions, None);
        let chat = out.chat_options.unwrap();
        assert_eq!(chat.temperature, None);
        assert!(chat.tools.is_empty());
    }
}
