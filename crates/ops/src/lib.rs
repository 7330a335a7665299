#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Installation session orchestration for apkm
//!
//! This crate sits between the CLI and the patching pipeline. A
//! [`PatchingSession`] owns the cancellable attempt, its install id and
//! timing, publishes the [`SessionState`](apkm_types::SessionState) cell and
//! persists exactly one installation record per attempt.

mod context;
mod session;

pub use context::{SessionContext, SessionContextBuilder};
pub use session::{PatchingSession, ABORTED_MESSAGE, INIT_FAILED_LOG};
