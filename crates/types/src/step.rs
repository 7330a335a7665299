//! Step lifecycle type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a single pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

impl StepState {
    /// Terminal states never change again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Skipped)
    }

    /// Whether moving from `self` to `next` respects
    /// Pending -> Running -> {Success, Failed, Skipped}.
    ///
    /// A step that never started may go straight from Pending to Skipped.
    #[must_use]
    pub fn can_transition_to(self, next: StepState) -> bool {
        match (self, next) {
            (Self::Pending, Self::Running | Self::Skipped) => true,
            (Self::Running, next) => next.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::Skipped => "Skipped",
        };
        f.write_str(s)
    }
}

/// Why a step ended up `Skipped`.
///
/// The observable state is the same for every cause; the cause only shows up
/// in logs and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipCause {
    /// The step had nothing to do (cached download, icon left untouched).
    NotNeeded,
    /// An earlier step failed.
    PriorFailure,
    /// The user cancelled the installation.
    Cancelled,
}

impl fmt::Display for SkipCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotNeeded => "not needed",
            Self::PriorFailure => "prior failure",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Coarse pipeline phase, ordered by execution
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StepGroup {
    Prepare,
    Download,
    Patch,
    Install,
}

impl StepGroup {
    /// All groups in execution order
    pub const ALL: [StepGroup; 4] = [
        StepGroup::Prepare,
        StepGroup::Download,
        StepGroup::Patch,
        StepGroup::Install,
    ];

    /// Label used in progress displays
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Prepare => "Prepare",
            Self::Download => "Download",
            Self::Patch => "Patch",
            Self::Install => "Install",
        }
    }
}

impl fmt::Display for StepGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_monotonic() {
        assert!(StepState::Pending.can_transition_to(StepState::Running));
        assert!(StepState::Pending.can_transition_to(StepState::Skipped));
        assert!(StepState::Running.can_transition_to(StepState::Success));
        assert!(StepState::Running.can_transition_to(StepState::Failed));
        assert!(StepState::Running.can_transition_to(StepState::Skipped));

        assert!(!StepState::Pending.can_transition_to(StepState::Success));
        assert!(!StepState::Running.can_transition_to(StepState::Running));
        assert!(!StepState::Running.can_transition_to(StepState::Pending));
        for terminal in [StepState::Success, StepState::Failed, StepState::Skipped] {
            assert!(!terminal.can_transition_to(StepState::Running));
            assert!(!terminal.can_transition_to(StepState::Pending));
        }
    }

    #[test]
    fn test_group_order() {
        let mut groups = vec![StepGroup::Install, StepGroup::Prepare, StepGroup::Patch];
        groups.sort();
        assert_eq!(
            groups,
            vec![StepGroup::Prepare, StepGroup::Patch, StepGroup::Install]
        );
    }
}
