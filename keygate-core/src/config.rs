//! Configuration management for the key gate

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Key gate configuration
///
/// The 24-hour key lifetime and the 24-character key length are invariants of the
/// system and deliberately not configurable.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GateConfig {
    /// Trusted referrer domain substring
    #[serde(default = "default_trusted_domain")]
    pub trusted_domain: String,

    /// Countdown tick period in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Path of the storage slot file; platform data directory when unset
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            trusted_domain: default_trusted_domain(),
            tick_interval_ms: default_tick_interval_ms(),
            storage_path: None,
        }
    }
}

impl GateConfig {
    /// Load configuration from environment variables (`KEYGATE_` prefix)
    pub fn from_env() -> Result<Self> {
        let config: Self = envy::prefixed("KEYGATE_")
            .from_env()
            .map_err(|e| Error::Config(format!("Failed to parse environment variables: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_yaml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.trusted_domain.trim().is_empty() {
            return Err(Error::Config("trusted_domain cannot be empty".to_string()));
        }

        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be > 0".to_string()));
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

// Default value functions
fn default_trusted_domain() -> String {
    "linkvertise.com".to_string()
}

fn default_tick_interval_ms() -> u64 {
    crate::DEFAULT_TICK_INTERVAL_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trusted_domain, "linkvertise.com");
        assert_eq!(config.tick_interval(), Duration::from_millis(60_000));
    }

    #[test]
    fn test_empty_trusted_domain_rejected() {
        let config = GateConfig {
            trusted_domain: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let config = GateConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.yaml");
        std::fs::write(&path, "trusted_domain: example.net\ntick_interval_ms: 1000\n").unwrap();

        let config = GateConfig::from_file(&path).unwrap();
        assert_eq!(config.trusted_domain, "example.net");
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.storage_path, None);
    }
}
