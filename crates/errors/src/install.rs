//! Installation procedure error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum InstallError {
    #[error("installation failed: {message}")]
    Failed { message: String },

    #[error("package source not found: {path}")]
    SourceNotFound { path: String },

    #[error("no installer entry point in {path}")]
    MissingSetup { path: String },

    #[error("filesystem operation failed: {operation} on {path}: {message}")]
    FilesystemError {
        operation: String,
        path: String,
        message: String,
    },

    #[error("delegated installer failed for {package} (exit code {exit_code:?})")]
    DelegateFailed {
        package: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("interpreter not found: {interpreter}")]
    InterpreterNotFound { interpreter: String },
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::DelegateFailed {
                package, stderr, ..
            } if !stderr.is_empty() => {
                Cow::Owned(format!("error installing {package}: {stderr}"))
            }
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::SourceNotFound { .. } => {
                Some("Point spkg at a package directory containing a src/ tree.")
            }
            Self::MissingSetup { .. } => {
                Some("The package source must ship its own setup.py entry point.")
            }
            Self::InterpreterNotFound { .. } => {
                Some("Install the interpreter or set python.command in the config.")
            }
            Self::DelegateFailed { .. } => {
                Some("Inspect the captured installer output; the source tree is left in place.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Self::Failed { .. } => Some("install.failed"),
            Self::SourceNotFound { .. } => Some("install.source_not_found"),
            Self::MissingSetup { .. } => Some("install.missing_setup"),
            Self::FilesystemError { .. } => Some("install.filesystem_error"),
            Self::DelegateFailed { .. } => Some("install.delegate_failed"),
            Self::InterpreterNotFound { .. } => Some("install.interpreter_not_found"),
            _ => None,
        }
    }
}
