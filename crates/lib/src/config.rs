//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.opsbot/config.json`) and environment.
//! Every field has a default, so a missing file or an empty `{}` is a working config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Assistant service connection.
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Conversation presentation defaults.
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    /// WebSocket endpoint of the assistant service (default "ws://localhost:8000/ws").
    /// Overridden by OPSBOT_ASSISTANT_URL env.
    #[serde(default = "default_assistant_url")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfig {
    /// Text of the welcome entry added when the connection opens.
    #[serde(default = "default_welcome_text")]
    pub welcome_text: String,

    /// Options offered under the welcome entry until the user first sends something.
    #[serde(default = "default_quick_options")]
    pub quick_options: Vec<String>,
}

fn default_assistant_url() -> String {
    "ws://localhost:8000/ws".to_string()
}

fn default_welcome_text() -> String {
    "How can I help you today?".to_string()
}

fn default_quick_options() -> Vec<String> {
    ["Issue related", "Update ticket", "Close ticket", "Ticket status"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            url: default_assistant_url(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            welcome_text: default_welcome_text(),
            quick_options: default_quick_options(),
        }
    }
}

/// Resolve the assistant URL: env OPSBOT_ASSISTANT_URL overrides config.
pub fn resolve_assistant_url(config: &Config) -> String {
    std::env::var("OPSBOT_ASSISTANT_URL")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .unwrap_or_else(|| config.assistant.url.trim().to_string())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("OPSBOT_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".opsbot").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, or the default path (or OPSBOT_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
