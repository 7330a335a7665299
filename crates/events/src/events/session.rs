use apkm_types::{InstallId, SessionState};
use serde::{Deserialize, Serialize};

/// Installation session events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A new attempt started
    Started { install_id: InstallId },

    /// The session state cell changed
    StateChanged { state: SessionState },

    /// The device ran out of storage during the attempt
    InsufficientStorage { install_id: InstallId },

    /// The installation record was persisted
    RecordStored { install_id: InstallId },

    /// The download cache was cleared
    CacheCleared,
}
