use crate::context::{require, StepContext};
use crate::step::{Step, StepCore, StepOutcome};
use apkm_errors::Error;
use async_trait::async_trait;

/// Installs the signed artifact on the device
#[derive(Debug, Default)]
pub struct InstallStep {
    core: StepCore,
}

impl InstallStep {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Step for InstallStep {
    step_metadata!(Install, "Install", Install);

    async fn run(&self, ctx: &StepContext) -> Result<StepOutcome, Error> {
        let signed = require(ctx.patch_state().signed_apk, self.name(), "signed APK")?;
        ctx.toolchain().installer.install(&signed).await?;
        Ok(StepOutcome::Completed)
    }
}
