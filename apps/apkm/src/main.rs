//! apkm - Patch, sign and install modded Android packages
//!
//! This is the main CLI application. It wires configuration, the event
//! channel and the installation session together and renders the results.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{CacheCommands, Cli, Commands, IconChoice, InstallArgs, LogsCommands};
use crate::display::{CommandResult, InstallReport, OutputRenderer};
use crate::error::CliError;
use crate::events::EventHandler;
use apkm_config::Config;
use apkm_errors::{Error, InstallError};
use apkm_events::{EventReceiver, EventSender};
use apkm_ops::{PatchingSession, SessionContextBuilder};
use apkm_patcher::Toolchain;
use apkm_state::{InstallLogStore, JsonInstallLogStore, RecordedError};
use apkm_types::{Color, IconReplacement, PatchOptions, SessionState};
use clap::Parser;
use std::path::Path;
use std::process;
use tokio::select;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting apkm v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global);

    let (event_sender, event_receiver) = apkm_events::channel();

    let renderer = OutputRenderer::new(cli.global.json, config.general.color);

    let colors_enabled = match config.general.color {
        apkm_types::ColorChoice::Always => true,
        apkm_types::ColorChoice::Never => false,
        apkm_types::ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.debug, cli.global.json);

    let result = execute_command_with_events(
        cli.command,
        &config,
        event_sender,
        event_receiver,
        &mut event_handler,
    )
    .await?;

    renderer.render_result(&result)?;

    if let CommandResult::Install(InstallReport {
        state: SessionState::Failed { .. },
        ..
    }) = result
    {
        return Err(CliError::InstallFailed);
    }

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    config: &Config,
    event_sender: EventSender,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CommandResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, config, event_sender));

    // Handle events concurrently with command execution
    loop {
        select! {
            // Command completed
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            // Event received
            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    config: &Config,
    event_sender: EventSender,
) -> Result<CommandResult, CliError> {
    match command {
        Commands::Install(args) => install(config, args, event_sender).await,

        Commands::Logs(logs_cmd) => {
            let store = JsonInstallLogStore::new(config.path_manager().logs_dir());
            match logs_cmd {
                LogsCommands::List => Ok(CommandResult::Records(store.list().await?)),
                LogsCommands::Show { id } => match store.get(id).await? {
                    Some(record) => Ok(CommandResult::Record(Box::new(record))),
                    None => Err(CliError::InvalidArguments(format!(
                        "no installation record with id {id}"
                    ))),
                },
                LogsCommands::Clear => {
                    store.delete_all().await?;
                    Ok(CommandResult::Success(
                        "Deleted all installation records".to_string(),
                    ))
                }
            }
        }

        Commands::Cache(CacheCommands::Clear) => {
            config.path_manager().clear_cache().await?;
            Ok(CommandResult::Success("Cleared download cache".to_string()))
        }

        Commands::Launch { package } => {
            let package = package.unwrap_or_else(|| PatchOptions::default().package_name);
            let toolchain = Toolchain::from_config(config)?;
            let launched = match toolchain.installer.launch(&package).await {
                Ok(()) => true,
                Err(Error::Install(InstallError::LaunchUnavailable { .. })) => false,
                Err(e) => return Err(e.into()),
            };
            Ok(CommandResult::Launched { package, launched })
        }
    }
}

/// Run one installation attempt; Ctrl-C cancels it
async fn install(
    config: &Config,
    args: InstallArgs,
    event_sender: EventSender,
) -> Result<CommandResult, CliError> {
    let launch = args.launch;
    let options = build_options(args).await?;

    let ctx = SessionContextBuilder::from_config(config)?
        .with_event_sender(event_sender)
        .build()?;
    let session = PatchingSession::new(ctx, options);
    let mut state_rx = session.subscribe();

    session.start().await?;

    select! {
        changed = state_rx.wait_for(SessionState::is_terminal) => {
            if changed.is_err() {
                warn!("session state channel closed before the attempt finished");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, cancelling installation");
            session.cancel().await?;
        }
    }

    let state = session.wait().await;
    let launched = if launch && state == SessionState::Success {
        session.launch_app().await?
    } else {
        false
    };

    let error = match state {
        SessionState::Failed { .. } => session.last_error().map(|e| RecordedError::from_error(&e)),
        _ => None,
    };

    Ok(CommandResult::Install(InstallReport {
        install_id: session.install_id(),
        state,
        error,
        launched,
    }))
}

/// Turn install arguments into patch options. Unset values keep their defaults.
async fn build_options(args: InstallArgs) -> Result<PatchOptions, CliError> {
    let mut options = PatchOptions::default();
    if let Some(name) = args.name {
        options.app_name = name;
    }
    if let Some(package) = args.package {
        options.package_name = package;
    }
    options.debuggable = args.debuggable;
    options.version_preference = args.channel;
    options.custom_version_code = args.version_code.unwrap_or_default();

    let icon = args.icon.or(match (&args.icon_color, &args.image) {
        (Some(_), _) => Some(IconChoice::Color),
        (None, Some(_)) => Some(IconChoice::Image),
        (None, None) => None,
    });
    match icon {
        None => {}
        Some(IconChoice::Original) => options.icon_replacement = IconReplacement::Original,
        Some(IconChoice::OldDiscord) => options.icon_replacement = IconReplacement::OldDiscord,
        Some(IconChoice::Color) => {
            let hex = args.icon_color.ok_or_else(|| {
                CliError::InvalidArguments("--icon color requires --icon-color".to_string())
            })?;
            options.icon_replacement = IconReplacement::CustomColor {
                color: Color::parse_hex(&hex)?,
            };
        }
        Some(IconChoice::Image) => {
            let path = args.image.ok_or_else(|| {
                CliError::InvalidArguments("--icon image requires --image".to_string())
            })?;
            options.icon_replacement = IconReplacement::CustomImage {
                image_bytes: read_image(&path).await?,
            };
        }
    }

    Ok(options)
}

async fn read_image(path: &Path) -> Result<Vec<u8>, CliError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path).into())
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    // Check if debug logging is enabled
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        let log_dir = Config::default().data_dir().join("debug");
        let file = std::fs::create_dir_all(&log_dir).and_then(|()| {
            let log_file = log_dir.join(format!(
                "apkm-{}.log",
                chrono::Utc::now().format("%Y%m%d-%H%M%S")
            ));
            std::fs::File::create(&log_file).map(|file| (file, log_file))
        });

        match file {
            Ok((file, log_file)) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                            |_| tracing_subscriber::EnvFilter::new("info,apkm=debug"),
                        ),
                    )
                    .init();

                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
                return;
            }
            Err(e) if !json_mode => eprintln!("Warning: Failed to create log file: {e}"),
            Err(_) => {}
        }
    }

    if json_mode {
        // JSON mode: suppress all console output to avoid contaminating JSON
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,apkm=warn")),
            )
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs) {
    if let Some(color) = global.color {
        config.general.color = color;
    }
}
