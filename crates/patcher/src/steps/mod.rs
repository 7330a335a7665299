//! Concrete pipeline steps

mod download;
mod fetch;
mod install;
mod patch;

pub use download::{DownloadBaseApkStep, DownloadInjectorStep};
pub use fetch::FetchInfoStep;
pub use install::InstallStep;
pub use patch::{
    next_dex_name, ExtractApkStep, InjectModStep, PatchIconsStep, PatchManifestStep, RepackStep,
    SignStep,
};
