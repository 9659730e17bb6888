//! Configuration management module
//!
//! Loads the engine configuration from YAML and applies environment overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use text_locator::coordinator::DEFAULT_CONTEXT_CHARS;
use text_locator::EngineConfig;
use tokio::fs;
use tracing::{info, warn};

pub const ENV_TIME_BUDGET_MS: &str = "TEXTANCHOR_TIME_BUDGET_MS";
pub const ENV_MIN_CONFIDENCE: &str = "TEXTANCHOR_MIN_CONFIDENCE";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Anchoring engine tunables
    pub engine: EngineConfig,

    /// Chars of context captured on each side when `create` derives it from the tree
    pub context_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            context_chars: DEFAULT_CONTEXT_CHARS,
        }
    }
}

impl Config {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("Failed to parse config file")
    }
}

/// Default location: `<config dir>/textanchor/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("textanchor");
    path.push("config.yaml");
    Some(path)
}

pub async fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => {
                warn!("No config directory available, using defaults");
                return Ok(Config::default());
            }
        },
    };

    if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .context("Failed to read config file")?;
        let config = Config::from_yaml_str(&content)?;
        info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        Ok(Config::default())
    }
}

/// Apply `TEXTANCHOR_*` environment overrides.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_TIME_BUDGET_MS) {
        config.engine.time_budget_ms = raw
            .trim()
            .parse()
            .with_context(|| format!("{ENV_TIME_BUDGET_MS} must be an integer, got '{raw}'"))?;
        info!("Time budget overridden to {}ms", config.engine.time_budget_ms);
    }
    if let Some(raw) = lookup(ENV_MIN_CONFIDENCE) {
        config.engine.min_confidence = raw
            .trim()
            .parse()
            .with_context(|| format!("{ENV_MIN_CONFIDENCE} must be a number, got '{raw}'"))?;
        info!("Minimum confidence overridden to {}", config.engine.min_confidence);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let config = Config::from_yaml_str("engine:\n  time_budget_ms: 120\n").unwrap();
        assert_eq!(config.engine.time_budget_ms, 120);
        assert_eq!(config.engine.min_confidence, 0.7);
        assert_eq!(config.context_chars, DEFAULT_CONTEXT_CHARS);
    }

    #[test]
    fn env_overrides_replace_engine_values() {
        let mut config = Config::default();
        apply_overrides_from(&mut config, |key| match key {
            ENV_TIME_BUDGET_MS => Some("5".to_string()),
            ENV_MIN_CONFIDENCE => Some(" 0.9 ".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.engine.time_budget_ms, 5);
        assert_eq!(config.engine.min_confidence, 0.9);
    }

    #[test]
    fn malformed_override_is_an_error() {
        let mut config = Config::default();
        let result = apply_overrides_from(&mut config, |key| {
            (key == ENV_TIME_BUDGET_MS).then(|| "soon".to_string())
        });
        assert!(result.is_err());
        assert_eq!(config.engine.time_budget_ms, 50);
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.yaml");
        let config = load_config(Some(absent.as_path())).await.unwrap();
        assert_eq!(config.engine.time_budget_ms, 50);

        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "context_chars: 8\n").unwrap();
        let config = load_config(Some(path.as_path())).await.unwrap();
        assert_eq!(config.context_chars, 8);
    }
}
