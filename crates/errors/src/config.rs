//! Configuration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("invalid config: {message}")]
    Invalid { message: String },

    #[error("parse error: {message}")]
    ParseError { message: String },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("environment variable not set: {var}")]
    EnvVarNotFound { var: String },

    #[error("installation prefix is not an absolute path: {path}")]
    RelativePrefix { path: String },
}

impl UserFacingError for ConfigError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::EnvVarNotFound { .. } => {
                Some("Set SPKG_LOCAL to the installation prefix, or enter the managed shell with `spkg-sh`.")
            }
            Self::RelativePrefix { .. } => {
                Some("Export SPKG_LOCAL as an absolute path to the installation prefix.")
            }
            Self::NotFound { .. } => Some("Provide a configuration file or rely on the built-in defaults."),
            Self::InvalidValue { .. } | Self::Invalid { .. } | Self::ParseError { .. } => {
                Some("Fix the configuration value and retry the command.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("config.not_found"),
            Self::Invalid { .. } => Some("config.invalid"),
            Self::ParseError { .. } => Some("config.parse_error"),
            Self::InvalidValue { .. } => Some("config.invalid_value"),
            Self::EnvVarNotFound { .. } => Some("config.env_var_not_found"),
            Self::RelativePrefix { .. } => Some("config.relative_prefix"),
            _ => None,
        }
    }
}
