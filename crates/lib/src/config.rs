//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.memchat/config.json`) and
//! environment. A missing file yields defaults that match the demo backend
//! (loopback, port 5001, memory on).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::api;
use crate::catalog;
use crate::controller::SessionSettings;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Backend endpoint settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Defaults applied to a fresh chat session.
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Where the chat backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Base URL (default "http://127.0.0.1:5001"). Overridden by MEMCHAT_BASE_URL env.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Optional request timeout in seconds. Unset = wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    api::DEFAULT_BASE_URL.to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

/// Initial session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfig {
    /// Provider preselected at startup (default "openai").
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model preselected at startup. Unset = first model of the provider's list.
    #[serde(default)]
    pub model: Option<String>,

    /// Whether the memory toggle starts on (default true).
    #[serde(default = "default_memory")]
    pub memory: bool,
}

fn default_provider() -> String {
    catalog::DEFAULT_PROVIDER.to_string()
}

fn default_memory() -> bool {
    true
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            memory: default_memory(),
        }
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("MEMCHAT_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".memchat").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Resolve the backend base URL: env MEMCHAT_BASE_URL overrides config.
pub fn resolve_base_url(config: &Config) -> String {
    std::env::var("MEMCHAT_BASE_URL")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| config.backend.base_url.trim().to_string())
}

/// Session settings for a fresh session: configured model, or the head of
/// the configured provider's catalog list when unset.
pub fn initial_settings(config: &Config) -> SessionSettings {
    let provider = config.chat.provider.clone();
    let model = config
        .chat
        .model
        .clone()
        .or_else(|| catalog::default_model(&provider).map(|m| m.to_string()))
        .unwrap_or_default();
    SessionSettings {
        provider,
        model,
        memory_enabled: config.chat.memory,
    }
}

/// Load config from the default path (or MEMCHAT_CONFIG_PATH). Missing file => default config.
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
