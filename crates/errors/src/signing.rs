//! Signing error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SigningError {
    #[error("signing tool not available: {tool}")]
    ToolUnavailable { tool: String },

    #[error("keystore not found: {path}")]
    KeystoreNotFound { path: String },

    #[error("signing failed: {reason}")]
    SigningFailed { reason: String },
}

impl UserFacingError for SigningError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ToolUnavailable { .. } => {
                Some("Install the Android build tools or set patching.apksigner in the config.")
            }
            Self::KeystoreNotFound { .. } => {
                Some("Set patching.keystore to an existing keystore file.")
            }
            Self::SigningFailed { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ToolUnavailable { .. } => "signing.tool_unavailable",
            Self::KeystoreNotFound { .. } => "signing.keystore_not_found",
            Self::SigningFailed { .. } => "signing.failed",
        };
        Some(code)
    }
}
