//! Simulation Configuration Module
//!
//! Loads runtime and logging settings from an optional TOML file with
//! environment variable overrides. Every field has a default, so an empty
//! environment and no file yields a usable configuration.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Default environment variable prefix (`ARENA_RUNTIME__OVERFLOW_CHECK=false`)
pub const ENV_PREFIX: &str = "ARENA";

/// Top-level configuration for a simulation process
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub runtime: RuntimeSettings,
    pub logging: LoggingConfig,
}

/// Knobs read by the actor runtime
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Fail an arena whose mailbox holds more envelopes than it has senders
    pub overflow_check: bool,

    /// Overflow limit used while an arena has no registered senders
    pub overflow_floor: usize,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            overflow_check: true,
            overflow_floor: 1,
        }
    }
}

impl RuntimeSettings {
    /// Mailbox limit for an actor with `senders` registered senders
    pub fn mailbox_limit(&self, senders: usize) -> Option<usize> {
        self.overflow_check.then(|| senders.max(self.overflow_floor))
    }
}

/// Tracing subscriber settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl SimulationConfig {
    /// Load from `path` (if given) with `ARENA_` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Load from `path` (if given) with overrides read from `{prefix}_SECTION__KEY`
    pub fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading simulation config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!(
            overflow_check = config.runtime.overflow_check,
            overflow_floor = config.runtime.overflow_floor,
            log_level = %config.logging.level,
            "Simulation config loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.runtime.overflow_floor == 0 {
            bail!("runtime.overflow_floor must be at least 1");
        }
        if self.logging.level.trim().is_empty() {
            bail!("logging.level must not be empty");
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    SimulationConfig::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_sources() {
        let config = SimulationConfig::load_with_prefix(None, "ARENA_TEST_EMPTY").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert!(config.runtime.overflow_check);
        assert_eq!(config.runtime.overflow_floor, 1);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("simulation.toml");

        let config_content = r#"
[runtime]
overflow_check = false

[logging]
level = "debug"
json = true
"#;
        fs::write(&config_path, config_content).unwrap();

        let config =
            SimulationConfig::load_with_prefix(Some(&config_path), "ARENA_TEST_FILE").unwrap();
        assert!(!config.runtime.overflow_check);
        // Missing keys keep their defaults
        assert_eq!(config.runtime.overflow_floor, 1);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_environment_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("simulation.toml");
        fs::write(&config_path, "[runtime]\noverflow_floor = 2\n").unwrap();

        std::env::set_var("ARENA_TEST_ENV_RUNTIME__OVERFLOW_FLOOR", "5");
        std::env::set_var("ARENA_TEST_ENV_RUNTIME__OVERFLOW_CHECK", "false");
        let config = SimulationConfig::load_with_prefix(Some(&config_path), "ARENA_TEST_ENV");
        std::env::remove_var("ARENA_TEST_ENV_RUNTIME__OVERFLOW_FLOOR");
        std::env::remove_var("ARENA_TEST_ENV_RUNTIME__OVERFLOW_CHECK");

        let config = config.unwrap();
        assert_eq!(config.runtime.overflow_floor, 5);
        assert!(!config.runtime.overflow_check);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(SimulationConfig::load_with_prefix(Some(&missing), "ARENA_TEST_MISSING").is_err());
    }

    #[test]
    fn test_zero_floor_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("simulation.toml");
        fs::write(&config_path, "[runtime]\noverflow_floor = 0\n").unwrap();

        let err = SimulationConfig::load_with_prefix(Some(&config_path), "ARENA_TEST_ZERO")
            .unwrap_err();
        assert!(err.to_string().contains("overflow_floor"));
    }

    #[test]
    fn test_mailbox_limit() {
        let settings = RuntimeSettings::default();
        assert_eq!(settings.mailbox_limit(0), Some(1));
        assert_eq!(settings.mailbox_limit(3), Some(3));

        let disabled = RuntimeSettings {
            overflow_check: false,
            ..RuntimeSettings::default()
        };
        assert_eq!(disabled.mailbox_limit(3), None);
    }

    #[test]
    fn test_rendered_toml_reloads() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("rendered.toml");
        let original = SimulationConfig {
            runtime: RuntimeSettings {
                overflow_check: false,
                overflow_floor: 4,
            },
            logging: LoggingConfig::default(),
        };
        fs::write(&config_path, original.to_toml().unwrap()).unwrap();

        let reloaded =
            SimulationConfig::load_with_prefix(Some(&config_path), "ARENA_TEST_RENDER").unwrap();
        assert_eq!(reloaded, original);
    }
}
