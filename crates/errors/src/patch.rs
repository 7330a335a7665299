//! Patching error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PatchError {
    #[error("invalid patch options: {field}: {reason}")]
    InvalidOptions { field: String, reason: String },

    #[error("no release matches {preference}")]
    ReleaseNotFound { preference: String },

    #[error("release {version} has no asset named {asset}")]
    MissingAsset { version: String, asset: String },

    #[error("step {step} requires {requirement} which is not available yet")]
    MissingPrerequisite { step: String, requirement: String },

    #[error("invalid archive {path}: {message}")]
    InvalidArchive { path: String, message: String },

    #[error("manifest patch failed: {message}")]
    ManifestFailed { message: String },

    #[error("icon patch failed: {message}")]
    IconFailed { message: String },

    #[error("step {step} panicked: {message}")]
    StepPanicked { step: String, message: String },

    #[error("duplicate step kind in pipeline: {kind}")]
    DuplicateStep { kind: String },
}

impl UserFacingError for PatchError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidOptions { .. } => Some("Correct the patch options and start again."),
            Self::ReleaseNotFound { .. } | Self::MissingAsset { .. } => {
                Some("Pick another version channel or version code.")
            }
            Self::InvalidArchive { .. } => Some("Clear the cache to force a fresh download."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidOptions { .. } => "patch.invalid_options",
            Self::ReleaseNotFound { .. } => "patch.release_not_found",
            Self::MissingAsset { .. } => "patch.missing_asset",
            Self::MissingPrerequisite { .. } => "patch.missing_prerequisite",
            Self::InvalidArchive { .. } => "patch.invalid_archive",
            Self::ManifestFailed { .. } => "patch.manifest_failed",
            Self::IconFailed { .. } => "patch.icon_failed",
            Self::StepPanicked { .. } => "patch.step_panicked",
            Self::DuplicateStep { .. } => "patch.duplicate_step",
        };
        Some(code)
    }
}
