//! Patch engine error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum PatchError {
    #[error("malformed patch at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("patch has no hunks")]
    Empty,

    #[error("hunk #{hunk} does not apply at line {line}: expected {expected:?}, found {found:?}")]
    HunkMismatch {
        hunk: usize,
        line: usize,
        expected: String,
        found: Option<String>,
    },

    #[error("patch target path escapes the source tree: {path}")]
    TargetEscapes { path: String },

    #[error("patch target has fewer than {strip} path components: {path}")]
    StripTooDeep { strip: usize, path: String },

    #[error("patch target not found: {path}")]
    TargetNotFound { path: String },
}

impl UserFacingError for PatchError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::HunkMismatch { .. } => {
                Some("The source does not match the pinned revision the patch was made against.")
            }
            Self::ParseError { .. } | Self::Empty => {
                Some("Regenerate the patch as a standard unified diff.")
            }
            Self::TargetNotFound { .. } => {
                Some("Check the patch header paths against the package source layout.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Self::ParseError { .. } => Some("patch.parse_error"),
            Self::Empty => Some("patch.empty"),
            Self::HunkMismatch { .. } => Some("patch.hunk_mismatch"),
            Self::TargetEscapes { .. } => Some("patch.target_escapes"),
            Self::StripTooDeep { .. } => Some("patch.strip_too_deep"),
            Self::TargetNotFound { .. } => Some("patch.target_not_found"),
            _ => None,
        }
    }
}
