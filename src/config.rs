use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log filter, overridable with `RUST_LOG`.
    pub log_level: String,

    /// Tokio worker threads; 0 picks the runtime default.
    pub worker_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend name: "sqlite", "redb", or "default".
    pub backend: String,

    /// Database location. A file path for both backends; ":memory:" is
    /// accepted by the sqlite backend.
    pub path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 0,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("subarr")
        .join("subarr.db")
        .to_string_lossy()
        .into_owned()
}

impl Config {
    pub fn load() -> Result<Self> {
        for path in Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(&path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("subarr.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("subarr").join("config.toml"));
        }
        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.path.is_empty() {
            bail!("storage.path must not be empty");
        }
        match self.storage.backend.as_str() {
            "sqlite" | "redb" | "pebble" | "default" => Ok(()),
            other => bail!("unknown storage backend {other:?} (expected sqlite or redb)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.backend, "sqlite");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut config = Config::default();
        config.storage.backend = "rocks".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let raw = r#"
            [general]
            log_level = "debug"

            [storage]
            backend = "redb"
            path = "/tmp/test.redb"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.storage.backend, "redb");
        assert!(config.validate().is_ok());
    }
}
