use crate::context::{require, StepContext};
use crate::step::{Step, StepCore, StepOutcome};
use crate::toolchain::ManifestPatch;
use apkm_errors::Error;
use apkm_events::EventEmitter;
use apkm_types::{IconReplacement, SkipCause};
use async_trait::async_trait;
use tokio::fs;

/// Unpacks the base package into the working directory
#[derive(Debug, Default)]
pub struct ExtractApkStep {
    core: StepCore,
}

impl ExtractApkStep {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Step for ExtractApkStep {
    step_metadata!(ExtractApk, "Extract APK", Patch);

    async fn run(&self, ctx: &StepContext) -> Result<StepOutcome, Error> {
        let base_apk = require(ctx.patch_state().base_apk, self.name(), "base APK")?;
        let apk_dir = ctx.paths().unpacked_apk_dir();

        match fs::remove_dir_all(&apk_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io_with_path(&e, &apk_dir)),
        }
        ctx.toolchain().archive.extract(&base_apk, &apk_dir, ctx.blocking()).await?;

        ctx.update_state(|state| state.apk_dir = Some(apk_dir));
        Ok(StepOutcome::Completed)
    }
}

/// Rewrites app name, package id and debuggable flag
#[derive(Debug, Default)]
pub struct PatchManifestStep {
    core: StepCore,
}

impl PatchManifestStep {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Step for PatchManifestStep {
    step_metadata!(PatchManifest, "Patch manifest", Patch);

    async fn run(&self, ctx: &StepContext) -> Result<StepOutcome, Error> {
        let apk_dir = require(ctx.patch_state().apk_dir, self.name(), "extracted APK")?;
        let patch = ManifestPatch::from(ctx.options());
        ctx.toolchain().editor.patch_manifest(&apk_dir, &patch).await?;
        Ok(StepOutcome::Completed)
    }
}

/// Applies the launcher icon replacement
#[derive(Debug, Default)]
pub struct PatchIconsStep {
    core: StepCore,
}

impl PatchIconsStep {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Step for PatchIconsStep {
    step_metadata!(PatchIcons, "Patch icons", Patch);

    async fn run(&self, ctx: &StepContext) -> Result<StepOutcome, Error> {
        let icon = &ctx.options().icon_replacement;
        if *icon == IconReplacement::Original {
            return Ok(StepOutcome::Skipped(SkipCause::NotNeeded));
        }
        let apk_dir = require(ctx.patch_state().apk_dir, self.name(), "extracted APK")?;
        ctx.toolchain().editor.patch_icons(&apk_dir, icon).await?;
        Ok(StepOutcome::Completed)
    }
}

/// Name for a dex file appended after the existing `classes*.dex` entries
pub fn next_dex_name<'a>(file_names: impl IntoIterator<Item = &'a str>) -> String {
    let highest = file_names
        .into_iter()
        .filter_map(|name| {
            let index = name.strip_prefix("classes")?.strip_suffix(".dex")?;
            if index.is_empty() {
                Some(1)
            } else {
                index.parse::<u32>().ok()
            }
        })
        .max();

    match highest {
        None => "classes.dex".to_string(),
        Some(n) => format!("classes{}.dex", n + 1),
    }
}

/// Adds the mod payload as an extra dex file
#[derive(Debug, Default)]
pub struct InjectModStep {
    core: StepCore,
}

impl InjectModStep {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Step for InjectModStep {
    step_metadata!(InjectMod, "Inject mod", Patch);

    async fn run(&self, ctx: &StepContext) -> Result<StepOutcome, Error> {
        let state = ctx.patch_state();
        let apk_dir = require(state.apk_dir, self.name(), "extracted APK")?;
        let injector = require(state.injector, self.name(), "injector")?;

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&apk_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &apk_dir))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::io_with_path(&e, &apk_dir))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        let dex_name = next_dex_name(names.iter().map(String::as_str));
        let target = apk_dir.join(&dex_name);
        fs::copy(&injector, &target)
            .await
            .map_err(|e| Error::io_with_path(&e, &target))?;

        ctx.emit_step_note(self.name(), format!("injected as {dex_name}"));
        Ok(StepOutcome::Completed)
    }
}

/// Zips the working tree into an unsigned package
#[derive(Debug, Default)]
pub struct RepackStep {
    core: StepCore,
}

impl RepackStep {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Step for RepackStep {
    step_metadata!(Repack, "Repack APK", Patch);

    async fn run(&self, ctx: &StepContext) -> Result<StepOutcome, Error> {
        let apk_dir = require(ctx.patch_state().apk_dir, self.name(), "extracted APK")?;
        let unsigned = ctx.paths().unsigned_apk();
        ctx.toolchain().archive.repack(&apk_dir, &unsigned, ctx.blocking()).await?;
        ctx.update_state(|state| state.unsigned_apk = Some(unsigned));
        Ok(StepOutcome::Completed)
    }
}

/// Signs the repacked package into the patched artifact path
#[derive(Debug, Default)]
pub struct SignStep {
    core: StepCore,
}

impl SignStep {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Step for SignStep {
    step_metadata!(Sign, "Sign APK", Patch);

    async fn run(&self, ctx: &StepContext) -> Result<StepOutcome, Error> {
        let unsigned = require(ctx.patch_state().unsigned_apk, self.name(), "unsigned APK")?;
        let signed = ctx.paths().patched_apk();
        ctx.toolchain().signer.sign(&unsigned, &signed).await?;
        ctx.update_state(|state| state.signed_apk = Some(signed));
        Ok(StepOutcome::Completed)
    }
}
