//! Configuration loading and config file resolution
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. User config file (`~/.config/coach/config.toml`)
//! 4. System config file (`/etc/coach/config.toml`)
//!
//! When no file is found every section falls back to its compiled default.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "COACH_CONFIG";

/// Default environment variable carrying the language-model API key
pub const API_KEY_ENV: &str = "COACH_LLM_API_KEY";

/// Complete service configuration as read from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    pub server: ServerConfig,
    pub pipeline: PipelineSettings,
    pub specialist: SpecialistSettings,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5740,
        }
    }
}

/// Feedback pipeline tuning
///
/// Values are kept as plain strings here; the feedback service validates
/// them against its own closed sets (plan names, categories, locales).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Default plan tier ("basic" or "premium")
    pub plan: String,
    /// Soft timeout for a single specialist call
    pub specialist_timeout_ms: u64,
    /// Ceiling for the whole fan-out
    pub global_timeout_ms: u64,
    /// Override for the cap applied to transcribed input
    pub max_suggestions_transcribed: Option<usize>,
    /// Override for the cap applied to typed input
    pub max_suggestions_typed: Option<usize>,
    /// Override for the deduplication tie-break order (category names)
    pub category_priority: Option<Vec<String>>,
    /// Summary language ("es" or "en")
    pub locale: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            plan: "premium".to_string(),
            specialist_timeout_ms: 12_000,
            global_timeout_ms: 20_000,
            max_suggestions_transcribed: None,
            max_suggestions_typed: None,
            category_priority: None,
            locale: "es".to_string(),
        }
    }
}

/// Language-model endpoint used by the specialists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialistSettings {
    /// OpenAI-compatible chat completions URL
    pub endpoint: String,
    pub model: String,
    /// API key (the environment variable takes precedence)
    pub api_key: Option<String>,
    /// Language explanations and tips are written in
    pub feedback_language: String,
    /// Shared request budget across all specialists
    pub requests_per_second: u32,
    /// HTTP-level timeout for one completion request
    pub request_timeout_ms: u64,
}

impl Default for SpecialistSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            feedback_language: "Spanish".to_string(),
            requests_per_second: 10,
            request_timeout_ms: 15_000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing directive (RUST_LOG overrides)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Resolve the config file path
///
/// Returns `None` when no candidate exists; callers then run on defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3/4: user then system config file
    default_config_candidates().into_iter().find(|p| p.exists())
}

fn default_config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("coach").join("config.toml"));
    }
    if cfg!(target_os = "linux") {
        candidates.push(PathBuf::from("/etc/coach/config.toml"));
    }
    candidates
}

/// Parse a TOML config file
pub fn load_config(path: &Path) -> Result<CoachConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    parse_config(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Parse TOML text into a config, filling missing fields with defaults
pub fn parse_config(content: &str) -> std::result::Result<CoachConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Resolve and load configuration
///
/// An explicitly named file (CLI or ENV) that cannot be read is an error;
/// a missing default file is not.
pub fn load_resolved_config(
    cli_arg: Option<&Path>,
    env_var_name: &str,
) -> Result<(CoachConfig, Option<PathBuf>)> {
    match resolve_config_path(cli_arg, env_var_name) {
        Some(path) => {
            let config = load_config(&path)?;
            info!("Configuration loaded from {}", path.display());
            Ok((config, Some(path)))
        }
        None => {
            info!("No configuration file found, using compiled defaults");
            Ok((CoachConfig::default(), None))
        }
    }
}

/// Resolve the language-model API key
///
/// **Priority:** ENV → TOML
pub fn resolve_api_key(env_var_name: &str, config: &CoachConfig) -> Result<String> {
    let env_key = std::env::var(env_var_name).ok().filter(|k| is_valid_key(k));
    let toml_key = config
        .specialist
        .api_key
        .as_ref()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "API key found in both environment and TOML config. Using environment ({}).",
            env_var_name
        );
    }

    if let Some(key) = env_key {
        info!("API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        info!("API key loaded from TOML config");
        return Ok(key.clone());
    }

    Err(Error::Config(format!(
        "Language-model API key not configured. Set {} or `api_key` under [specialist] in config.toml",
        env_var_name
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
