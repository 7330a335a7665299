//! Builds the ordered step list for a set of patch options

use crate::runner::StepRunner;
use crate::step::Step;
use crate::steps::{
    DownloadBaseApkStep, DownloadInjectorStep, ExtractApkStep, FetchInfoStep, InjectModStep,
    InstallStep, PatchIconsStep, PatchManifestStep, RepackStep, SignStep,
};
use apkm_errors::Error;
use apkm_types::PatchOptions;

/// Pipeline assembler for one installation attempt
#[derive(Debug, Clone)]
pub struct PatchRunner {
    options: PatchOptions,
}

impl PatchRunner {
    /// Validate the options and prepare an assembler for them.
    ///
    /// # Errors
    ///
    /// Returns `PatchError::InvalidOptions` if the options are rejected.
    pub fn new(options: PatchOptions) -> Result<Self, Error> {
        options.validate()?;
        Ok(Self { options })
    }

    #[must_use]
    pub fn options(&self) -> &PatchOptions {
        &self.options
    }

    /// Fresh steps in execution order, groups non-decreasing
    #[must_use]
    pub fn steps(&self) -> Vec<Box<dyn Step>> {
        vec![
            // Prepare
            Box::new(FetchInfoStep::new()),
            // Download
            Box::new(DownloadBaseApkStep::new()),
            Box::new(DownloadInjectorStep::new()),
            // Patch
            Box::new(ExtractApkStep::new()),
            Box::new(PatchManifestStep::new()),
            Box::new(PatchIconsStep::new()),
            Box::new(InjectModStep::new()),
            Box::new(RepackStep::new()),
            Box::new(SignStep::new()),
            // Install
            Box::new(InstallStep::new()),
        ]
    }

    /// Hand the assembled steps to a runner
    ///
    /// # Errors
    ///
    /// Returns an error if the step list contains a duplicated kind.
    pub fn into_runner(self) -> Result<StepRunner, Error> {
        StepRunner::new(self.steps())
    }
}
