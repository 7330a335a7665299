use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Download transfer events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    Started {
        url: String,
        total_bytes: Option<u64>,
    },
    Progress {
        url: String,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },
    Completed {
        url: String,
        bytes_downloaded: u64,
    },
    Failed {
        url: String,
        failure: FailureContext,
    },
}
