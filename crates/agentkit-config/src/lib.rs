// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for agentkit.
//!
//! This crate provides [`AgentkitConfig`] (project endpoint, vendor
//! credentials, memory store settings) together with helpers for loading
//! from TOML files, applying environment overrides, merging overlays, and
//! producing advisory [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },

    /// A value the caller needs is not configured.
    #[error("missing required setting '{field}' (set {env_var} or add it to the config file)")]
    MissingSetting {
        /// Dotted config path.
        field: String,
        /// Environment variable that supplies it.
        env_var: String,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// An endpoint uses plain HTTP for a non-local host.
    InsecureEndpoint {
        /// Dotted config path.
        field: String,
        /// The endpoint.
        url: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::InsecureEndpoint { field, url } => {
                write!(f, "'{field}' uses plain http: {url}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level agentkit configuration.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct AgentkitConfig {
    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Hosted agent project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSettings>,

    /// OpenAI-compatible Responses endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAISettings>,

    /// Anthropic-compatible Messages endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<AnthropicSettings>,

    /// Hosted memory store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemorySettings>,
}

impl Default for AgentkitConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".into()),
            project: None,
            openai: None,
            anthropic: None,
            memory: None,
        }
    }
}

/// Hosted agent project settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ProjectSettings {
    /// Project endpoint, e.g. `https://<resource>.services.ai.azure.com/api/projects/<project>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Model deployment used by samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_name: Option<String>,
    /// `api-version` query value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Bearer token for the project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// OpenAI-compatible endpoint settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct OpenAISettings {
    /// API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL (defaults to the public API).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Anthropic-compatible endpoint settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct AnthropicSettings {
    /// API key (sent as `x-api-key`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL (defaults to the public API).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Default `max_tokens`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Memory store settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct MemorySettings {
    /// Memory store name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    /// Chat model the store uses to extract memories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_model: Option<String>,
    /// Embedding model the store uses for search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    /// Upper bound on memories injected per turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_memories: Option<u32>,
    /// Seconds the service waits before processing an update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_delay_secs: Option<u32>,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Environment variables consulted by [`apply_env_overrides`].
pub const ENV_VARS: &[&str] = &[
    "AGENTKIT_LOG_LEVEL",
    "AZURE_FOUNDRY_PROJECT_ENDPOINT",
    "AZURE_FOUNDRY_PROJECT_DEPLOYMENT_NAME",
    "AZURE_FOUNDRY_PROJECT_TOKEN",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "OPENAI_MODEL",
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_BASE_URL",
    "ANTHROPIC_MODEL",
    "AGENTKIT_MEMORY_STORE",
];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load an [`AgentkitConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`AgentkitConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<AgentkitConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => AgentkitConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into an [`AgentkitConfig`].
pub fn parse_toml(content: &str) -> Result<AgentkitConfig, ConfigError> {
    toml::from_str::<AgentkitConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply overrides from the process environment (see [`ENV_VARS`]).
pub fn apply_env_overrides(config: &mut AgentkitConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary lookup; blank values are ignored.
pub fn apply_overrides_from<F>(config: &mut AgentkitConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(val) = get("AGENTKIT_LOG_LEVEL") {
        config.log_level = Some(val);
    }

    let project = [
        get("AZURE_FOUNDRY_PROJECT_ENDPOINT"),
        get("AZURE_FOUNDRY_PROJECT_DEPLOYMENT_NAME"),
        get("AZURE_FOUNDRY_PROJECT_TOKEN"),
    ];
    if project.iter().any(Option::is_some) {
        let [endpoint, deployment, token] = project;
        let p = config.project.get_or_insert_with(Default::default);
        p.endpoint = endpoint.or(p.endpoint.take());
        p.deployment_name = deployment.or(p.deployment_name.take());
        p.token = token.or(p.token.take());
    }

    let openai = [get("OPENAI_API_KEY"), get("OPENAI_BASE_URL"), get("OPENAI_MODEL")];
    if openai.iter().any(Option::is_some) {
        let [key, url, model] = openai;
        let o = config.openai.get_or_insert_with(Default::default);
        o.api_key = key.or(o.api_key.take());
        o.base_url = url.or(o.base_url.take());
        o.model = model.or(o.model.take());
    }

    let anthropic = [
        get("ANTHROPIC_API_KEY"),
        get("ANTHROPIC_BASE_URL"),
        get("ANTHROPIC_MODEL"),
    ];
    if anthropic.iter().any(Option::is_some) {
        let [key, url, model] = anthropic;
        let a = config.anthropic.get_or_insert_with(Default::default);
        a.api_key = key.or(a.api_key.take());
        a.base_url = url.or(a.base_url.take());
        a.model = model.or(a.model.take());
    }

    if let Some(store) = get("AGENTKIT_MEMORY_STORE") {
        config.memory.get_or_insert_with(Default::default).store_name = Some(store);
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl AgentkitConfig {
    /// The project endpoint, or an error naming the variable that sets it.
    pub fn require_project_endpoint(&self) -> Result<&str, ConfigError> {
        self.project
            .as_ref()
            .and_then(|p| p.endpoint.as_deref())
            .ok_or_else(|| missing("project.endpoint", "AZURE_FOUNDRY_PROJECT_ENDPOINT"))
    }

    /// The project model deployment.
    pub fn require_deployment_name(&self) -> Result<&str, ConfigError> {
        self.project
            .as_ref()
            .and_then(|p| p.deployment_name.as_deref())
            .ok_or_else(|| {
                missing(
                    "project.deployment_name",
                    "AZURE_FOUNDRY_PROJECT_DEPLOYMENT_NAME",
                )
            })
    }

    /// The memory store name.
    pub fn require_memory_store(&self) -> Result<&str, ConfigError> {
        self.memory
            .as_ref()
            .and_then(|m| m.store_name.as_deref())
            .ok_or_else(|| missing("memory.store_name", "AGENTKIT_MEMORY_STORE"))
    }
}

fn missing(field: &str, env_var: &str) -> ConfigError {
    ConfigError::MissingSetting {
        field: field.into(),
        env_var: env_var.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn check_url(field: &str, url: &str, errors: &mut Vec<String>, warnings: &mut Vec<ConfigWarning>) {
    let rest = if let Some(rest) = url.strip_prefix("https://") {
        rest
    } else if let Some(rest) = url.strip_prefix("http://") {
        let host = rest.split(['/', ':']).next().unwrap_or_default();
        if !matches!(host, "localhost" | "127.0.0.1" | "[::1]") {
            warnings.push(ConfigWarning::InsecureEndpoint {
                field: field.into(),
                url: url.into(),
            });
        }
        rest
    } else {
        errors.push(format!("{field}: '{url}' is not an absolute http(s) URL"));
        return;
    };
    if rest.is_empty() || rest.starts_with('/') {
        errors.push(format!("{field}: '{url}' has no host"));
    }
}

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (bad log level, non-absolute endpoints, zero limits) are
/// returned as a [`ConfigError::ValidationError`]; soft issues come back as
/// warnings.
pub fn validate_config(config: &AgentkitConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = config.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }

    match &config.project {
        Some(project) => {
            if let Some(url) = &project.endpoint {
                check_url("project.endpoint", url, &mut errors, &mut warnings);
            }
            if project.deployment_name.as_deref().is_some_and(|d| d.trim().is_empty()) {
                errors.push("project.deployment_name must not be blank".into());
            }
        }
        None => warnings.push(ConfigWarning::MissingOptionalField {
            field: "project".into(),
            hint: "hosted agent samples need a project endpoint".into(),
        }),
    }

    if let Some(url) = config.openai.as_ref().and_then(|o| o.base_url.as_ref()) {
        check_url("openai.base_url", url, &mut errors, &mut warnings);
    }

    if let Some(anthropic) = &config.anthropic {
        if let Some(url) = &anthropic.base_url {
            check_url("anthropic.base_url", url, &mut errors, &mut warnings);
        }
        if anthropic.max_tokens == Some(0) {
            errors.push("anthropic.max_tokens must be greater than zero".into());
        }
    }

    match &config.memory {
        Some(memory) => {
            if memory.max_memories == Some(0) {
                errors.push("memory.max_memories must be greater than zero".into());
            }
            if memory.store_name.as_deref().is_some_and(|s| s.trim().is_empty()) {
                errors.push("memory.store_name must not be blank".into());
            }
        }
        None => warnings.push(ConfigWarning::MissingOptionalField {
            field: "memory".into(),
            hint: "the memory sample needs a store name".into(),
        }),
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

macro_rules! overlay_fields {
    ($base:expr, $overlay:expr, $($field:ident),+) => {
        match ($base, $overlay) {
            (Some(b), Some(o)) => Some({
                let mut merged = b;
                $( merged.$field = o.$field.or(merged.$field); )+
                merged
            }),
            (b, o) => o.or(b),
        }
    };
}

/// Merge two configurations. Values in `overlay` take precedence over `base`,
/// field by field within each section.
pub fn merge_configs(base: AgentkitConfig, overlay: AgentkitConfig) -> AgentkitConfig {
    AgentkitConfig {
        log_level: overlay.log_level.or(base.log_level),
        project: overlay_fields!(
            base.project,
            overlay.project,
            endpoint,
            deployment_name,
            api_version,
            token
        ),
        openai: overlay_fields!(base.openai, overlay.openai, api_key, base_url, model),
        anthropic: overlay_fields!(
            base.anthropic,
            overlay.anthropic,
            api_key,
            base_url,
            model,
            max_tokens
        ),
        memory: overlay_fields!(
            base.memory,
            overlay.memory,
            store_name,
            chat_model,
            embedding_model,
            max_memories,
            update_delay_secs
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
