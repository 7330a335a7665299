//! Local and device storage errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// `ENOSPC` on Linux and Android.
const ENOSPC: i32 = 28;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Host disk or device storage is full. Reported to the user once per attempt.
    #[error("insufficient storage: {path}")]
    InsufficientStorage { path: String },

    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("IO error: {message}")]
    IoError { message: String },
}

/// Whether an I/O error reports that the device ran out of space.
#[must_use]
pub fn is_out_of_space(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::StorageFull || err.raw_os_error() == Some(ENOSPC)
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        if is_out_of_space(&err) {
            Self::InsufficientStorage {
                path: String::new(),
            }
        } else if err.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied {
                path: String::new(),
            }
        } else {
            Self::IoError {
                message: err.to_string(),
            }
        }
    }
}

impl UserFacingError for StorageError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::InsufficientStorage { .. } => {
                Cow::Borrowed("There is not enough free storage to finish the installation")
            }
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InsufficientStorage { .. } => {
                Some("Free up storage on the device and retry the installation.")
            }
            Self::PermissionDenied { .. } => {
                Some("Adjust filesystem permissions of the data and cache directories.")
            }
            Self::IoError { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::IoError { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InsufficientStorage { .. } => "storage.insufficient_storage",
            Self::PermissionDenied { .. } => "storage.permission_denied",
            Self::IoError { .. } => "storage.io_error",
        };
        Some(code)
    }
}
