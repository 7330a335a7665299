#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Installation records for apkm
//!
//! Every installation attempt, successful or not, leaves exactly one
//! [`InstallRecord`] behind. Records are kept as one JSON file per install id
//! so they can be attached to bug reports as-is.

pub mod models;
pub mod store;

pub use models::{EnvironmentInfo, InstallRecord, RecordedError};
pub use store::{InstallLogStore, JsonInstallLogStore, MemoryInstallLogStore};
