use apkm_types::{SkipCause, StepGroup, StepState};
use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Pipeline and per-step lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StepEvent {
    /// A pipeline was assembled and is about to run
    PipelineStarted { steps: Vec<String> },

    /// A step moved to a new state
    StateChanged {
        step: String,
        group: StepGroup,
        state: StepState,
        #[serde(skip_serializing_if = "Option::is_none")]
        cause: Option<SkipCause>,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        failure: Option<FailureContext>,
    },

    /// Free-form progress note from inside a step
    Note { step: String, message: String },

    /// The pipeline finished executing
    PipelineFinished { success: bool, duration_ms: u64 },
}
