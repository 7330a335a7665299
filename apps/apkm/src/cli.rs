//! Command line interface definition

use apkm_types::{ColorChoice, VersionPreference};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use uuid::Uuid;

/// apkm - Patch, sign and install modded Android packages
#[derive(Parser)]
#[command(name = "apkm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Patch, sign and install modded Android packages")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to the data directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Download, patch, sign and install the app
    #[command(alias = "i")]
    Install(InstallArgs),

    /// Inspect stored installation records
    #[command(subcommand)]
    Logs(LogsCommands),

    /// Manage the download cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Launch an installed package on the device
    Launch {
        /// Package to launch (defaults to the default package name)
        #[arg(long)]
        package: Option<String>,
    },
}

/// Launcher icon choice on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IconChoice {
    Original,
    OldDiscord,
    Color,
    Image,
}

#[derive(clap::Args)]
pub struct InstallArgs {
    /// User-facing app name
    #[arg(long)]
    pub name: Option<String>,

    /// Package name to install as
    #[arg(long)]
    pub package: Option<String>,

    /// Mark the app debuggable
    #[arg(long)]
    pub debuggable: bool,

    /// Launcher icon replacement
    #[arg(long, value_enum)]
    pub icon: Option<IconChoice>,

    /// Icon background as #RRGGBB or #AARRGGBB (with --icon color)
    #[arg(long, value_name = "HEX")]
    pub icon_color: Option<String>,

    /// Foreground image (with --icon image)
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,

    /// Release channel
    #[arg(long, value_enum, default_value_t = VersionPreference::Stable)]
    pub channel: VersionPreference,

    /// Version code to install with --channel custom
    #[arg(long)]
    pub version_code: Option<String>,

    /// Launch the app after a successful install
    #[arg(long)]
    pub launch: bool,
}

#[derive(Subcommand)]
pub enum LogsCommands {
    /// List installation records, newest first
    #[command(alias = "ls")]
    List,

    /// Show one installation record
    Show {
        /// Install id
        id: Uuid,
    },

    /// Delete all installation records
    Clear,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Remove cached downloads
    Clear,
}
