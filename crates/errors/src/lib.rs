#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the apkm patch manager
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone so a failure can be retained by a step,
//! reported to the UI and persisted in an installation record.

use std::borrow::Cow;

use thiserror::Error;

pub mod config;
pub mod install;
pub mod network;
pub mod patch;
pub mod signing;
pub mod storage;

// Re-export all error types at the root
pub use config::ConfigError;
pub use install::InstallError;
pub use network::NetworkError;
pub use patch::PatchError;
pub use signing::SigningError;
pub use storage::{is_out_of_space, StorageError};

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("install error: {0}")]
    Install(#[from] InstallError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an error from an `io::Error` with an associated path.
    ///
    /// Out-of-space conditions become [`StorageError::InsufficientStorage`].
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        let path = path.into();
        if is_out_of_space(err) {
            return Self::Storage(StorageError::InsufficientStorage {
                path: path.display().to_string(),
            });
        }
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path),
        }
    }

    /// Whether this error is the device-out-of-space condition.
    ///
    /// This is the only classifier callers should use; the UI shows a
    /// dedicated message for it.
    #[must_use]
    pub fn is_insufficient_storage(&self) -> bool {
        match self {
            Self::Storage(StorageError::InsufficientStorage { .. }) => true,
            Self::Io { kind, .. } => *kind == std::io::ErrorKind::StorageFull,
            _ => false,
        }
    }

    /// Whether this error represents a cancellation rather than a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Install(InstallError::Cancelled))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        if is_out_of_space(&err) {
            return Self::Storage(StorageError::InsufficientStorage {
                path: String::new(),
            });
        }
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for apkm operations
pub type Result<T> = std::result::Result<T, Error>;

/// What the CLI and the installation records show for an error
pub trait UserFacingError {
    fn user_message(&self) -> Cow<'_, str>;

    /// What the user can do about it
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Starting a new attempt may succeed
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable dotted code, e.g. `storage.insufficient_storage`
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Network(err) => err.user_message(),
            Error::Storage(err) => err.user_message(),
            Error::Patch(err) => err.user_message(),
            Error::Install(err) => err.user_message(),
            Error::Signing(err) => err.user_message(),
            Error::Config(err) => err.user_message(),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Network(err) => err.user_hint(),
            Error::Storage(err) => err.user_hint(),
            Error::Patch(err) => err.user_hint(),
            Error::Install(err) => err.user_hint(),
            Error::Signing(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            Error::Io { kind, .. } if *kind == std::io::ErrorKind::StorageFull => {
                Some("Free up storage on the device and retry the installation.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(err) => err.is_retryable(),
            Error::Storage(err) => err.is_retryable(),
            Error::Install(err) => err.is_retryable(),
            Error::Io { .. } => true,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Network(err) => err.user_code(),
            Error::Storage(err) => err.user_code(),
            Error::Patch(err) => err.user_code(),
            Error::Install(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Signing(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
            Error::Cancelled => Some("error.cancelled"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
