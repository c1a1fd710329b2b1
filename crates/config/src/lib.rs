#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for spkg
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (TOML, optional)
//! - Environment variables
//!
//! The installation prefix itself is not configuration: it is a required
//! environment variable (`SPKG_LOCAL`) resolved per invocation, and its
//! absence is a fatal configuration error.

use serde::{Deserialize, Serialize};
use spkg_errors::{ConfigError, Error};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Environment variable designating the installation prefix.
pub const PREFIX_ENV_VAR: &str = "SPKG_LOCAL";

/// Environment variable overriding the Python interpreter.
pub const PYTHON_ENV_VAR: &str = "SPKG_PYTHON";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub python: PythonConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// Python interpreter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonConfig {
    #[serde(default = "default_python_command")]
    pub command: String,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            command: default_python_command(),
        }
    }
}

/// Path layout under the installation prefix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Location of installed Python modules, relative to the prefix.
    #[serde(default = "default_site_packages")]
    pub site_packages: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            site_packages: default_site_packages(),
        }
    }
}

impl Config {
    /// Load configuration from a file, or fall back to defaults when no
    /// path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file is missing or fails
    /// to parse.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;

        let config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Merge environment variable overrides into the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an override has an invalid value.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(command) = std::env::var(PYTHON_ENV_VAR) {
            if command.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: PYTHON_ENV_VAR.to_string(),
                    value: command,
                }
                .into());
            }
            tracing::debug!(command = %command, "python interpreter overridden from environment");
            self.python.command = command;
        }

        Ok(())
    }
}

/// Installation prefix: the base directory under which built artifacts are
/// placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPrefix {
    root: PathBuf,
}

impl InstallPrefix {
    /// Create a prefix from an already-resolved path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::RelativePrefix` if the path is not absolute.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        if !root.is_absolute() {
            return Err(ConfigError::RelativePrefix {
                path: root.display().to_string(),
            }
            .into());
        }
        Ok(Self { root })
    }

    /// Resolve the prefix from the `SPKG_LOCAL` environment variable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvVarNotFound` if the variable is unset or
    /// empty, and `ConfigError::RelativePrefix` if it is not absolute.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_env_var(PREFIX_ENV_VAR)
    }

    /// Resolve the prefix from an arbitrary environment variable.
    ///
    /// # Errors
    ///
    /// Same conditions as [`InstallPrefix::from_env`].
    pub fn from_env_var(var: &str) -> Result<Self, Error> {
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => Self::new(value),
            _ => Err(ConfigError::EnvVarNotFound {
                var: var.to_string(),
            }
            .into()),
        }
    }

    /// Base directory of the prefix.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding installed Python modules under this prefix.
    #[must_use]
    pub fn site_packages(&self, config: &Config) -> PathBuf {
        self.root.join(&config.paths.site_packages)
    }
}

// Default value functions for serde
fn default_python_command() -> String {
    "python".to_string()
}

fn default_site_packages() -> PathBuf {
    PathBuf::from("lib/python/site-packages")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.python.command, "python");
        assert_eq!(
            config.paths.site_packages,
            PathBuf::from("lib/python/site-packages")
        );
    }

    #[test]
    fn prefix_requires_absolute_path() {
        let err = InstallPrefix::new("opt/spkg").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::RelativePrefix { .. })
        ));
    }

    #[test]
    fn missing_env_var_is_a_config_error() {
        let err = InstallPrefix::from_env_var("SPKG_TEST_UNSET_PREFIX").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::EnvVarNotFound { .. })
        ));
    }

    #[test]
    fn env_var_resolves_prefix() {
        std::env::set_var("SPKG_TEST_SET_PREFIX", "/opt/spkg");
        let prefix = InstallPrefix::from_env_var("SPKG_TEST_SET_PREFIX").unwrap();
        assert_eq!(prefix.root(), Path::new("/opt/spkg"));

        let config = Config::default();
        assert_eq!(
            prefix.site_packages(&config),
            PathBuf::from("/opt/spkg/lib/python/site-packages")
        );
    }

    #[tokio::test]
    async fn load_parses_toml_overrides() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "[python]\ncommand = \"python3\"\n\n[paths]\nsite_packages = \"lib/python3.13/site-packages\"\n",
        )
        .unwrap();

        let config = Config::load_or_default(Some(&path)).await.unwrap();
        assert_eq!(config.python.command, "python3");
        assert_eq!(
            config.paths.site_packages,
            PathBuf::from("lib/python3.13/site-packages")
        );
    }

    #[tokio::test]
    async fn explicit_missing_config_file_errors() {
        let temp = tempdir().unwrap();
        let err = Config::load_or_default(Some(&temp.path().join("nope.toml")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NotFound { .. })));
    }
}
