//! Step contract and the execution boundary shared by every step

use crate::context::StepContext;
use apkm_errors::{Error, PatchError};
use apkm_events::{AppEvent, EventEmitter, FailureContext, StepEvent};
use apkm_types::{SkipCause, StepGroup, StepState};
use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Every kind of step the pipeline knows about. Each kind appears at most once
/// in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    FetchInfo,
    DownloadBaseApk,
    DownloadInjector,
    ExtractApk,
    PatchManifest,
    PatchIcons,
    InjectMod,
    Repack,
    Sign,
    Install,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a step body reports when it returns normally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Skipped(SkipCause),
}

#[derive(Debug)]
struct StepStatus {
    state: StepState,
    cause: Option<SkipCause>,
    started: Option<Instant>,
    finished: Option<Instant>,
    error: Option<Error>,
}

/// Lifecycle bookkeeping embedded in every step.
///
/// Only the runner boundary mutates it. Transitions that would move a step
/// backwards are rejected and leave the state untouched.
#[derive(Debug)]
pub struct StepCore {
    status: Mutex<StepStatus>,
}

impl Default for StepCore {
    fn default() -> Self {
        Self::new()
    }
}

impl StepCore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: Mutex::new(StepStatus {
                state: StepState::Pending,
                cause: None,
                started: None,
                finished: None,
                error: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StepStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn state(&self) -> StepState {
        self.lock().state
    }

    #[must_use]
    pub fn skip_cause(&self) -> Option<SkipCause> {
        self.lock().cause
    }

    /// Error retained by a failed step
    #[must_use]
    pub fn error(&self) -> Option<Error> {
        self.lock().error.clone()
    }

    /// Wall time between start and end, zero if the step never started.
    /// A running step reports the time elapsed so far.
    #[must_use]
    pub fn duration(&self) -> Duration {
        let status = self.lock();
        match (status.started, status.finished) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    /// Pending -> Running. Returns false if the step already started.
    pub(crate) fn begin(&self) -> bool {
        let mut status = self.lock();
        if !status.state.can_transition_to(StepState::Running) {
            return false;
        }
        status.state = StepState::Running;
        status.started = Some(Instant::now());
        true
    }

    /// Move to a terminal state. Returns false if the transition is illegal.
    pub(crate) fn finish(
        &self,
        state: StepState,
        cause: Option<SkipCause>,
        error: Option<Error>,
    ) -> bool {
        let mut status = self.lock();
        if !state.is_terminal() || !status.state.can_transition_to(state) {
            return false;
        }
        if status.started.is_some() {
            status.finished = Some(Instant::now());
        }
        status.state = state;
        status.cause = cause;
        status.error = error;
        true
    }
}

/// A single unit of pipeline work
#[async_trait]
pub trait Step: Send + Sync + 'static {
    fn kind(&self) -> StepKind;

    /// Human readable name used in logs and progress output
    fn name(&self) -> &'static str;

    fn group(&self) -> StepGroup;

    fn core(&self) -> &StepCore;

    /// File a download step began writing, once the transfer starts
    fn download_target(&self) -> Option<PathBuf> {
        None
    }

    /// The step body. Only [`execute_step`] calls this.
    async fn run(&self, ctx: &StepContext) -> Result<StepOutcome, Error>;

    fn as_any(&self) -> &dyn Any;
}

/// Point-in-time copy of a step for display
#[derive(Debug, Clone)]
pub struct StepSnapshot {
    pub kind: StepKind,
    pub name: &'static str,
    pub group: StepGroup,
    pub state: StepState,
    pub cause: Option<SkipCause>,
    pub duration: Duration,
    pub error: Option<Error>,
}

impl StepSnapshot {
    pub(crate) fn of(step: &dyn Step) -> Self {
        let core = step.core();
        Self {
            kind: step.kind(),
            name: step.name(),
            group: step.group(),
            state: core.state(),
            cause: core.skip_cause(),
            duration: core.duration(),
            error: core.error(),
        }
    }
}

/// Run one step inside the boundary: honour cancellation, catch panics and
/// record the terminal state. Returns the state the step ended in.
pub async fn execute_step(step: &dyn Step, ctx: &StepContext) -> StepState {
    let core = step.core();

    if ctx.is_cancelled() {
        mark_skipped(step, ctx, SkipCause::Cancelled);
        return core.state();
    }

    if !core.begin() {
        return core.state();
    }
    emit_state(step, ctx);

    let body = AssertUnwindSafe(step.run(ctx)).catch_unwind();
    let result = tokio::select! {
        biased;
        () = ctx.cancel_token().cancelled() => None,
        result = body => Some(result),
    };

    let (state, cause, error) = match result {
        None => (StepState::Skipped, Some(SkipCause::Cancelled), None),
        Some(Ok(Ok(StepOutcome::Completed))) => (StepState::Success, None, None),
        Some(Ok(Ok(StepOutcome::Skipped(cause)))) => (StepState::Skipped, Some(cause), None),
        Some(Ok(Err(e))) if e.is_cancelled() || ctx.is_cancelled() => {
            (StepState::Skipped, Some(SkipCause::Cancelled), None)
        }
        Some(Ok(Err(e))) => (StepState::Failed, None, Some(e)),
        Some(Err(panic)) => {
            let error = PatchError::StepPanicked {
                step: step.name().to_string(),
                message: panic_message(panic.as_ref()),
            };
            (StepState::Failed, None, Some(error.into()))
        }
    };

    core.finish(state, cause, error);
    emit_state(step, ctx);
    core.state()
}

/// Skip a step that never started
pub(crate) fn mark_skipped(step: &dyn Step, ctx: &StepContext, cause: SkipCause) {
    if step.core().finish(StepState::Skipped, Some(cause), None) {
        emit_state(step, ctx);
    }
}

fn emit_state(step: &dyn Step, ctx: &StepContext) {
    let core = step.core();
    let duration_ms = u64::try_from(core.duration().as_millis()).unwrap_or(u64::MAX);
    ctx.emit(AppEvent::Step(StepEvent::StateChanged {
        step: step.name().to_string(),
        group: step.group(),
        state: core.state(),
        cause: core.skip_cause(),
        duration_ms,
        failure: core.error().as_ref().map(FailureContext::from_error),
    }));
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
