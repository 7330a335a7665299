#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Patch installation pipeline for apkm
//!
//! A pipeline is an ordered list of [`Step`]s driven by a [`StepRunner`].
//! [`PatchRunner`] assembles the standard list: fetch release info, download
//! the base package and injector, unpack, patch, inject, repack, sign and
//! install. Steps reach the outside world only through the [`Toolchain`] in
//! their [`StepContext`].

#[macro_use]
mod macros;

mod assembler;
mod context;
mod release;
mod runner;
mod step;
pub mod steps;
pub mod toolchain;

pub use assembler::PatchRunner;
pub use context::{require, PatchState, StepContext};
pub use release::{
    select_release, GithubReleaseSource, ReleaseAsset, ReleaseSource, ResolvedRelease,
    BASE_APK_ASSET, INJECTOR_ASSET,
};
pub use runner::StepRunner;
pub use step::{execute_step, Step, StepCore, StepKind, StepOutcome, StepSnapshot};
pub use toolchain::{
    ApkArchive, ApkEditor, ApkSigner, BlockingScope, Downloader, PackageInstaller, Toolchain,
};

// Re-export so callers can build contexts without another dependency
pub use tokio_util::sync::CancellationToken;
