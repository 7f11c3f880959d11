//! AutoBlog configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AutoblogError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoblogConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for AutoblogConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            scheduler: SchedulerConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl AutoblogConfig {
    /// Load config from the default path (~/.autoblog/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AutoblogError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| AutoblogError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AutoblogError::Config(format!("Failed to create config dir: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AutoblogError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)
            .map_err(|e| AutoblogError::Config(format!("Failed to write config: {e}")))?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the AutoBlog home directory (~/.autoblog).
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".autoblog")
    }
}

/// Content Generator (generative API) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// API key; falls back to the GEMINI_API_KEY env var when empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Writing tone for autonomous publishes.
    #[serde(default = "default_tone")]
    pub tone: String,
    /// Per-request timeout. A hung upstream call otherwise pins the publish
    /// guard forever; expiry surfaces as a hard generation error.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retry attempts for transient (rate-limit/overload) failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base retry delay in milliseconds; doubles per attempt.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
}

fn default_model() -> String { "gemini-2.0-flash".into() }
fn default_endpoint() -> String { "https://generativelanguage.googleapis.com/v1beta".into() }
fn default_tone() -> String { "Professional & Engaging".into() }
fn default_timeout_secs() -> u64 { 90 }
fn default_max_retries() -> u32 { 3 }
fn default_retry_base_ms() -> u64 { 2000 }

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            endpoint: default_endpoint(),
            tone: default_tone(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
        }
    }
}

/// Background sweep intervals and the slot materialization horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Due-post promoter sweep (scheduled posts whose time has come).
    #[serde(default = "default_promote_secs")]
    pub promote_interval_secs: u64,
    /// Topic prefetch sweep.
    #[serde(default = "default_prefetch_secs")]
    pub prefetch_interval_secs: u64,
    /// Due-slot publish sweep.
    #[serde(default = "default_publish_secs")]
    pub publish_interval_secs: u64,
    /// Niche launch-time trigger sweep (minute granularity).
    #[serde(default = "default_trigger_secs")]
    pub trigger_interval_secs: u64,
    /// Slot materialization sweep (idempotent; advances the rolling horizon).
    #[serde(default = "default_materialize_secs")]
    pub materialize_interval_secs: u64,
    /// How many days ahead of today slots are materialized.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

fn default_promote_secs() -> u64 { 1 }
fn default_prefetch_secs() -> u64 { 5 }
fn default_publish_secs() -> u64 { 5 }
fn default_trigger_secs() -> u64 { 60 }
fn default_materialize_secs() -> u64 { 60 }
fn default_horizon_days() -> u32 { 7 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            promote_interval_secs: default_promote_secs(),
            prefetch_interval_secs: default_prefetch_secs(),
            publish_interval_secs: default_publish_secs(),
            trigger_interval_secs: default_trigger_secs(),
            materialize_interval_secs: default_materialize_secs(),
            horizon_days: default_horizon_days(),
        }
    }
}

/// Store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path; "~/.autoblog/autoblog.db" by default.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String { "~/.autoblog/autoblog.db".into() }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AutoblogConfig::default();
        assert_eq!(cfg.generator.max_retries, 3);
        assert_eq!(cfg.generator.retry_base_ms, 2000);
        assert_eq!(cfg.scheduler.horizon_days, 7);
        assert_eq!(cfg.scheduler.trigger_interval_secs, 60);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: AutoblogConfig = toml::from_str(
            r#"
            [generator]
            api_key = "k"
            model = "gemini-2.0-pro"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.generator.api_key, "k");
        assert_eq!(cfg.generator.model, "gemini-2.0-pro");
        assert_eq!(cfg.generator.timeout_secs, 90);
        assert_eq!(cfg.scheduler.prefetch_interval_secs, 5);
    }
}
