use crate::context::StepContext;
use crate::step::{Step, StepCore, StepOutcome};
use apkm_errors::Error;
use apkm_events::EventEmitter;
use async_trait::async_trait;

/// Resolves the release to install from the configured channel
#[derive(Debug, Default)]
pub struct FetchInfoStep {
    core: StepCore,
}

impl FetchInfoStep {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Step for FetchInfoStep {
    step_metadata!(FetchInfo, "Fetch release info", Prepare);

    async fn run(&self, ctx: &StepContext) -> Result<StepOutcome, Error> {
        let options = ctx.options();
        let release = ctx
            .toolchain()
            .releases
            .resolve(options.version_preference, &options.custom_version_code)
            .await?;

        ctx.emit_step_note(self.name(), format!("resolved version {}", release.version));
        ctx.update_state(|state| state.release = Some(release));
        Ok(StepOutcome::Completed)
    }
}
