use anyhow::{Result, bail};
use clap::{CommandFactory, Parser};
use log::{debug, info, warn};

use musa::cli::Args;
use musa::config::Settings;
use musa::core::edit_events::{ImportSheetRequest, LoadCollectionRequest, SaveCollectionRequest};
use musa::paths::{LOG_FILE, PathConfig, SETTINGS_FILE};
use musa::shell::{Shell, init_logger};

fn main() -> Result<()> {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    let has_work = args.file_path.is_some() || args.demo || args.sheet.is_some() || args.list || args.save.is_some();
    if !has_work {
        let _ = Args::command().print_help();
        println!();
        return Ok(());
    }

    // Create path configuration from CLI args and environment
    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = path_config.ensure_dirs() {
        eprintln!("Warning: {:#}", e);
    }

    // `--log` without a value logs to the data directory
    let log_path = args
        .log_file
        .as_ref()
        .map(|p| p.clone().unwrap_or_else(|| path_config.data_file(LOG_FILE)));
    init_logger(args.verbosity, log_path.as_deref())?;
    if let Some(path) = &log_path {
        info!("Logging to file: {}", path.display());
    }

    info!("musa {} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);

    let settings_path = path_config.config_file(SETTINGS_FILE);
    info!("Config path: {}", settings_path.display());
    let settings = Settings::load(&settings_path).unwrap_or_else(|e| {
        warn!("{:#}, using defaults", e);
        Settings::default()
    });
    let sheet_cell = args.cell.unwrap_or_else(|| settings.sheet_cell());

    let mut shell = Shell::with_settings(settings);

    if args.demo {
        shell.load_demo();
    }
    if let Some(path) = &args.file_path {
        shell.bus.emit(LoadCollectionRequest(path.clone()));
    }
    if let Some(path) = &args.sheet {
        shell.bus.emit(ImportSheetRequest {
            path: path.clone(),
            cell: sheet_cell,
            offset: args.offset,
            base_name: args.base_name.clone(),
        });
    }
    if let Some(path) = &args.save {
        shell.bus.emit(SaveCollectionRequest(path.clone()));
    }
    shell.pump();

    if let Some(msg) = shell.error_msg.take() {
        bail!(msg);
    }

    if args.list {
        print!("{}", shell.summary());
    }

    if let Err(e) = shell.settings.save(&settings_path) {
        warn!("{:#}", e);
    }
    Ok(())
}
