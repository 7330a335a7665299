//! Installation record model

use apkm_errors::{Error, UserFacingError};
use apkm_types::{InstallId, PatchOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error captured in an installation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedError {
    pub code: Option<String>,
    pub message: String,
    pub hint: Option<String>,
    /// The user aborted or cancelled the installation
    #[serde(default)]
    pub aborted: bool,
    /// The device ran out of space
    #[serde(default)]
    pub insufficient_storage: bool,
}

impl RecordedError {
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        Self {
            code: error.user_code().map(Into::into),
            message: error.user_message().into_owned(),
            hint: error.user_hint().map(Into::into),
            aborted: error.is_cancelled(),
            insufficient_storage: error.is_insufficient_storage(),
        }
    }

    /// Synthetic error for an installation the user walked away from
    #[must_use]
    pub fn aborted(message: impl Into<String>) -> Self {
        Self {
            code: Some("install.cancelled".to_string()),
            message: message.into(),
            hint: None,
            aborted: true,
            insufficient_storage: false,
        }
    }
}

/// Host the installation ran on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub app_version: String,
    pub os: String,
    pub arch: String,
}

impl EnvironmentInfo {
    #[must_use]
    pub fn current() -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Durable outcome of one installation attempt. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRecord {
    pub id: InstallId,
    pub started_at: DateTime<Utc>,
    /// Sum of step durations
    pub duration_ms: u64,
    pub options: PatchOptions,
    pub log: String,
    pub error: Option<RecordedError>,
    pub environment: EnvironmentInfo,
}

impl InstallRecord {
    #[must_use]
    pub fn new(
        id: InstallId,
        started_at: DateTime<Utc>,
        duration: Duration,
        options: PatchOptions,
        log: impl Into<String>,
        error: Option<RecordedError>,
    ) -> Self {
        Self {
            id,
            started_at,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            options,
            log: log.into(),
            error,
            environment: EnvironmentInfo::current(),
        }
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
