//! Ordered step execution with short-circuit and skip semantics

use crate::context::StepContext;
use crate::step::{execute_step, mark_skipped, Step, StepKind, StepSnapshot};
use apkm_errors::{Error, PatchError};
use apkm_events::{AppEvent, EventEmitter, StepEvent};
use apkm_types::{SkipCause, StepGroup, StepState};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

/// Owns the ordered steps of one pipeline.
///
/// Insertion order is execution order. Steps are only ever executed once; a
/// retry needs a freshly assembled runner.
pub struct StepRunner {
    steps: Vec<Box<dyn Step>>,
    registry: HashMap<StepKind, usize>,
}

impl std::fmt::Debug for StepRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRunner")
            .field("steps", &self.steps.iter().map(|s| s.kind()).collect::<Vec<_>>())
            .finish()
    }
}

impl StepRunner {
    /// Build the runner and its kind registry.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::DuplicateStep`] if two steps share a kind.
    pub fn new(steps: Vec<Box<dyn Step>>) -> Result<Self, Error> {
        let mut registry = HashMap::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            if registry.insert(step.kind(), index).is_some() {
                return Err(PatchError::DuplicateStep {
                    kind: step.kind().to_string(),
                }
                .into());
            }
        }
        Ok(Self { steps, registry })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> impl Iterator<Item = &dyn Step> {
        self.steps.iter().map(|s| s.as_ref())
    }

    #[must_use]
    pub fn snapshots(&self) -> Vec<StepSnapshot> {
        self.steps().map(StepSnapshot::of).collect()
    }

    /// Snapshots clustered by group, groups in execution order
    #[must_use]
    pub fn grouped(&self) -> BTreeMap<StepGroup, Vec<StepSnapshot>> {
        let mut groups: BTreeMap<StepGroup, Vec<StepSnapshot>> = BTreeMap::new();
        for step in self.steps() {
            groups
                .entry(step.group())
                .or_default()
                .push(StepSnapshot::of(step));
        }
        groups
    }

    #[must_use]
    pub fn try_step(&self, kind: StepKind) -> Option<&dyn Step> {
        self.registry.get(&kind).map(|&index| self.steps[index].as_ref())
    }

    /// Look up a step by kind.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline has no step of this kind. Asking for a kind the
    /// assembler never adds is a programming error.
    #[must_use]
    pub fn step(&self, kind: StepKind) -> &dyn Step {
        match self.try_step(kind) {
            Some(step) => step,
            None => panic!("step {kind} is not part of this pipeline"),
        }
    }

    /// Look up a step by its concrete type.
    ///
    /// # Panics
    ///
    /// Panics if no step of type `T` is part of the pipeline.
    #[must_use]
    pub fn get_step<T: Step>(&self) -> &T {
        match self.steps().find_map(|s| s.as_any().downcast_ref::<T>()) {
            Some(step) => step,
            None => panic!("step {} is not part of this pipeline", std::any::type_name::<T>()),
        }
    }

    /// Execute every step in order.
    ///
    /// Returns the error of the first failed step; every later step is then
    /// skipped as a prior failure. Cancellation skips the remaining steps and
    /// returns `None`, as does full success. Blocking work abandoned by a
    /// cancelled step has ended by the time this returns.
    pub async fn execute_all(&self, ctx: &StepContext) -> Option<Error> {
        ctx.emit(AppEvent::Step(StepEvent::PipelineStarted {
            steps: self.steps().map(|s| s.name().to_string()).collect(),
        }));

        let mut failure: Option<Error> = None;
        for step in self.steps() {
            if failure.is_some() {
                mark_skipped(step, ctx, SkipCause::PriorFailure);
                continue;
            }
            if ctx.is_cancelled() {
                mark_skipped(step, ctx, SkipCause::Cancelled);
                continue;
            }

            if execute_step(step, ctx).await == StepState::Failed {
                failure = Some(step.core().error().unwrap_or_else(|| {
                    Error::internal(format!("step {} failed without an error", step.name()))
                }));
            }
        }
        ctx.drain_blocking().await;

        ctx.emit(AppEvent::Step(StepEvent::PipelineFinished {
            success: failure.is_none() && !ctx.is_cancelled(),
            duration_ms: u64::try_from(self.total_duration().as_millis()).unwrap_or(u64::MAX),
        }));
        failure
    }

    /// One line per step, in execution order
    #[must_use]
    pub fn log(&self) -> String {
        let mut out = String::new();
        for step in self.steps() {
            let core = step.core();
            let _ = write!(out, "- [{}] {}: {}", step.group(), step.name(), core.state());
            if let Some(cause) = core.skip_cause() {
                let _ = write!(out, " ({cause})");
            }
            let _ = writeln!(out, " in {}ms", core.duration().as_millis());
            if let Some(error) = core.error() {
                let _ = writeln!(out, "  error: {error}");
            }
        }
        out
    }

    /// Sum of the individual step durations
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.steps().map(|s| s.core().duration()).sum()
    }

    /// Targets of downloads that began and were then cancelled.
    ///
    /// Read after the run has been joined; those files may be partial.
    #[must_use]
    pub fn interrupted_downloads(&self) -> Vec<PathBuf> {
        self.steps()
            .filter(|s| {
                s.core().state() == StepState::Skipped
                    && s.core().skip_cause() == Some(SkipCause::Cancelled)
            })
            .filter_map(|s| s.download_target())
            .collect()
    }
}
