//! The `galaxy` binary: resolve directories, load config, apply CLI
//! overrides, start logging, and run the viewer.

use std::process::ExitCode;

use clap::Parser;
use galaxy_app::platform::PlatformDirs;
use galaxy_config::{CliArgs, Config};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let dirs = match PlatformDirs::resolve_with_override(args.config.as_deref()) {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Failed to resolve platform directories: {e}");
            return ExitCode::FAILURE;
        }
    };
    let dirs_error = dirs.create_dirs().err();

    let (mut config, load_error) = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let clamped = match config.apply_cli_overrides(&args) {
        Ok(clamped) => clamped,
        Err(e) => {
            eprintln!("Invalid command-line arguments: {e}");
            return ExitCode::from(2);
        }
    };

    let log_dir = dirs_error.is_none().then_some(dirs.log_dir.as_path());
    galaxy_log::init_logging(log_dir, cfg!(debug_assertions), Some(&config));

    info!("Galaxy viewer v{}", env!("CARGO_PKG_VERSION"));
    info!("Config directory: {}", dirs.config_dir.display());
    if let Some(e) = dirs_error {
        warn!("Could not create application directories, file logging disabled: {e}");
    }
    if let Some(e) = load_error {
        warn!("Using default config: {e}");
    }
    for clamp in &clamped {
        warn!("{clamp}");
    }

    match galaxy_app::run(config, dirs.config_dir) {
        Ok(()) => {
            info!("Exited cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
