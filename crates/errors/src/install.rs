//! Installation error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum InstallError {
    #[error("installation failed: {message}")]
    Failed { message: String },

    #[error("installer not available: {tool}")]
    InstallerUnavailable { tool: String },

    #[error("installer rejected the package: {reason}")]
    Rejected { reason: String },

    #[error("no launcher activity for package: {package}")]
    LaunchUnavailable { package: String },

    #[error("installation cancelled by user")]
    Cancelled,
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InstallerUnavailable { .. } => {
                Some("Install adb or set patching.adb in the config.")
            }
            Self::Rejected { .. } => {
                Some("Uninstall any conflicting build signed with a different key and retry.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Failed { .. } => "install.failed",
            Self::InstallerUnavailable { .. } => "install.installer_unavailable",
            Self::Rejected { .. } => "install.rejected",
            Self::LaunchUnavailable { .. } => "install.launch_unavailable",
            Self::Cancelled => "install.cancelled",
        };
        Some(code)
    }
}
