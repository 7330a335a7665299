use crate::context::{require, PatchState, StepContext};
use crate::release::{BASE_APK_ASSET, INJECTOR_ASSET};
use crate::step::{Step, StepCore, StepOutcome};
use apkm_config::PathManager;
use apkm_errors::Error;
use apkm_events::EventEmitter;
use apkm_types::SkipCause;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tokio::fs;

/// What differs between the two download steps
struct DownloadSpec {
    asset: &'static str,
    target: fn(&PathManager, &str) -> PathBuf,
    store: fn(&mut PatchState, PathBuf),
}

/// Target path of a download step, known once the release is resolved
#[derive(Debug, Default)]
struct TargetSlot(Mutex<Option<PathBuf>>);

impl TargetSlot {
    fn set(&self, path: PathBuf) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(path);
    }

    fn get(&self) -> Option<PathBuf> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

async fn download(
    step: &dyn Step,
    slot: &TargetSlot,
    spec: &DownloadSpec,
    ctx: &StepContext,
) -> Result<StepOutcome, Error> {
    let release = require(ctx.patch_state().release, step.name(), "release info")?;
    let target = (spec.target)(ctx.paths(), &release.version);

    if fs::try_exists(&target).await.unwrap_or(false) {
        ctx.emit_step_note(step.name(), format!("using cached {}", target.display()));
        ctx.update_state(|state| (spec.store)(state, target));
        return Ok(StepOutcome::Skipped(SkipCause::NotNeeded));
    }
    // Only a transfer that actually began can leave a partial file behind
    slot.set(target.clone());

    let asset = release.asset(spec.asset)?;
    if let Err(e) = ctx
        .toolchain()
        .downloader
        .download(&asset.url, &target, ctx.event_sender())
        .await
    {
        let _ = fs::remove_file(&target).await;
        return Err(e);
    }

    ctx.update_state(|state| (spec.store)(state, target));
    Ok(StepOutcome::Completed)
}

/// Downloads the unmodified base package into the cache
#[derive(Debug, Default)]
pub struct DownloadBaseApkStep {
    core: StepCore,
    target: TargetSlot,
}

impl DownloadBaseApkStep {
    const SPEC: DownloadSpec = DownloadSpec {
        asset: BASE_APK_ASSET,
        target: PathManager::cached_base_apk,
        store: |state, path| state.base_apk = Some(path),
    };

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Step for DownloadBaseApkStep {
    step_metadata!(DownloadBaseApk, "Download base APK", Download);

    fn download_target(&self) -> Option<PathBuf> {
        self.target.get()
    }

    async fn run(&self, ctx: &StepContext) -> Result<StepOutcome, Error> {
        download(self, &self.target, &Self::SPEC, ctx).await
    }
}

/// Downloads the mod payload into the cache
#[derive(Debug, Default)]
pub struct DownloadInjectorStep {
    core: StepCore,
    target: TargetSlot,
}

impl DownloadInjectorStep {
    const SPEC: DownloadSpec = DownloadSpec {
        asset: INJECTOR_ASSET,
        target: PathManager::cached_injector,
        store: |state, path| state.injector = Some(path),
    };

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Step for DownloadInjectorStep {
    step_metadata!(DownloadInjector, "Download injector", Download);

    fn download_target(&self) -> Option<PathBuf> {
        self.target.get()
    }

    async fn run(&self, ctx: &StepContext) -> Result<StepOutcome, Error> {
        download(self, &self.target, &Self::SPEC, ctx).await
    }
}
