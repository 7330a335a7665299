#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the apkm patch manager
//!
//! This crate provides the value types shared by the pipeline, the session
//! controller and the CLI: patch options, step lifecycle states and the
//! session state exposed to the UI.

pub mod options;
pub mod session;
pub mod step;

// Re-export commonly used types
pub use options::{Color, IconReplacement, PatchOptions, VersionPreference};
pub use session::{InstallId, SessionState};
pub use step::{SkipCause, StepGroup, StepState};
pub use uuid::Uuid;

use serde::{Deserialize, Serialize};

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    #[default]
    Auto,
    Never,
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}
