#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for versolve
//!
//! This crate handles loading and merging resolver configuration from:
//! - Default values (hard-coded)
//! - Configuration file (`<config dir>/versolve/config.toml`)
//! - Environment variables (`VERSOLVE_*`)

pub mod constants;
pub mod core;

pub use core::{DiagnosticsSection, ResolverSection, SolverSection};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use versolve_errors::{ConfigError, Error};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResolverConfig {
    #[serde(default)]
    pub resolver: ResolverSection,

    #[serde(default)]
    pub solver: SolverSection,

    #[serde(default)]
    pub diagnostics: DiagnosticsSection,
}

impl ResolverConfig {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the platform config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::CONFIG_DIR_NAME)
            .join(constants::CONFIG_FILE_NAME))
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this structure.
    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents).map_err(|e| {
            ConfigError::ParseError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        Self::from_toml_str(&contents)
    }

    /// Load configuration from the default location, or defaults if absent
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: &Option<PathBuf>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge environment variable overrides
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable does not parse as its field's type.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Some(value) = env_override(constants::ENV_RESULT_CACHE)? {
            self.resolver.result_cache = value;
        }
        if let Some(value) = env_override(constants::ENV_MISSING_PREVIOUS_IS_ERROR)? {
            self.resolver.missing_previous_version_is_error = value;
        }
        if let Some(value) = env_override(constants::ENV_NUDGE_INTERVAL)? {
            self.solver.nudge_interval = value;
        }
        if let Some(value) = env_override(constants::ENV_ALL_ANSWERS_LIMIT)? {
            self.solver.all_answers_limit = value;
        }
        if let Some(value) = env_override(constants::ENV_MAX_CONSTRAINTS_PER_PACKAGE)? {
            self.diagnostics.max_constraints_per_package = value;
        }
        Ok(())
    }

    /// Validate all configuration settings
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), Error> {
        let zero_fields = [
            ("solver.nudge_interval", self.solver.nudge_interval == 0),
            ("solver.all_answers_limit", self.solver.all_answers_limit == 0),
            (
                "diagnostics.max_constraints_per_package",
                self.diagnostics.max_constraints_per_package == 0,
            ),
        ];
        if let Some((field, _)) = zero_fields.into_iter().find(|(_, zero)| *zero) {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn env_override<T: FromStr>(name: &str) -> Result<Option<T>, Error> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            ConfigError::InvalidValue {
                field: name.to_string(),
                value: raw,
            }
            .into()
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert!(config.resolver.result_cache);
        assert!(!config.resolver.missing_previous_version_is_error);
        assert_eq!(config.solver.nudge_interval, 1000);
        assert_eq!(config.solver.all_answers_limit, 1000);
        assert_eq!(config.diagnostics.max_constraints_per_package, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config = ResolverConfig::from_toml_str("[solver]\nnudge_interval = 5\n").unwrap();
        assert_eq!(config.solver.nudge_interval, 5);
        assert_eq!(config.solver.all_answers_limit, 1000);
        assert!(config.resolver.result_cache);
    }

    #[test]
    fn test_validate_rejects_zero() {
        let mut config = ResolverConfig::default();
        config.diagnostics.max_constraints_per_package = 0;
        let err = config.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("diagnostics.max_constraints_per_package"));
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            ResolverConfig::from_toml_str("[solver]\nnudge_interval = \"x\""),
            Err(Error::Config(ConfigError::ParseError { .. }))
        ));
    }
}
