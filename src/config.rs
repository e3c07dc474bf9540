//! Runtime configuration: `graphkb.yml`, `.env` and environment overrides

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "graphkb.yml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding source snapshots and schemas.
    pub data_dir: PathBuf,
    pub event_bus_capacity: usize,
    /// 0 disables the timeout.
    pub query_timeout_secs: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from(".graphkb"),
            event_bus_capacity: 100,
            query_timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load `.env`, then the config file, then apply `GRAPHKB_DATA_DIR` and
    /// `GRAPHKB_LOG`. Without an explicit path a missing `graphkb.yml` falls
    /// back to the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("GRAPHKB_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("GRAPHKB_LOG") {
            self.log_level = level;
        }
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_secs > 0).then(|| Duration::from_secs(self.query_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("data_dir: /var/lib/graphkb\nquery_timeout_secs: 0\n").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/graphkb"));
        assert_eq!(config.event_bus_capacity, 100);
        assert_eq!(config.query_timeout(), None);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            "GRAPHKB_DATA_DIR" => Some("/tmp/kb".to_string()),
            "GRAPHKB_LOG" => Some("debug".to_string()),
            _ => None,
        });
        assert_eq!(config.data_dir, PathBuf::from("/tmp/kb"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.query_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_missing_explicit_file() {
        assert!(Config::from_file(Path::new("/nonexistent/graphkb.yml")).is_err());
    }
}
