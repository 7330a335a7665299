//! Session state exposed to the UI layer

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one installation attempt
pub type InstallId = Uuid;

/// State of the installation screen
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// An attempt is running
    #[default]
    Working,
    /// The patched package was installed
    Success,
    /// The attempt failed; the record for `install_id` holds the details
    Failed { install_id: InstallId },
    /// The attempt was aborted and the screen should close
    CloseScreen,
}

impl SessionState {
    /// Whether the session reached a final state
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Working)
    }
}
