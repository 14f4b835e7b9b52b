// Application entry point for the WinInfoApp system information viewer

// Command line arguments
mod cli;
// Settings file
mod config;
// Administrator / root checks and relaunch
mod elevation;
// Application error type
mod error;
// Byte and uptime formatting
mod format;
// The GUI shell, pages and widgets
mod gui;
// Tracing subscriber setup
mod logging;
// Data models for rows and drives
mod models;
// OS queries
mod probe;

use clap::Parser;
use elevation::Elevation;
use std::process::ExitCode;
use std::sync::Arc;

const APP_NAME: &str = "WinInfoApp";

/// Entry point for the application.
/// Makes sure the process is elevated, loads settings and launches the GUI.
fn main() -> ExitCode {
    let args = cli::Args::parse();
    logging::init();

    if !args.no_elevate {
        let forwarded: Vec<String> = std::env::args().skip(1).collect();
        match elevation::ensure_elevated(&forwarded) {
            Ok(Elevation::AlreadyElevated) => tracing::debug!("running elevated"),
            Ok(Elevation::Relaunched) => {
                tracing::info!("restarted with elevated rights, exiting");
                return ExitCode::SUCCESS;
            }
            Ok(Elevation::Unsupported) => {
                tracing::warn!("not running as root; physical disks and partitions will be missing")
            }
            Err(e) => {
                elevation::show_fatal(APP_NAME, &e.to_string());
                return ExitCode::FAILURE;
            }
        }
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            elevation::show_fatal(APP_NAME, &e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Builds the shared context and runs the event loop until the window closes.
fn run(args: cli::Args) -> error::Result<()> {
    let settings_path = config::resolve_settings_path(args.config.as_deref());
    let settings = config::Settings::load_or_default(&settings_path);
    tracing::info!(
        path = %settings_path.display(),
        language = settings.language.code(),
        "settings loaded"
    );

    let sampler = Arc::new(probe::TemperatureSampler::new(
        probe::temperature::default_source(),
    ));
    let provider = probe::SystemInfoProvider::new(sampler);
    let app = gui::AppContext::new(
        settings,
        settings_path,
        provider,
        Arc::new(probe::SystemDriveEnumerator),
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_NAME)
            .with_inner_size([900.0, 600.0])
            .with_min_inner_size([520.0, 360.0]),
        ..Default::default()
    };

    let open_cpu_window = args.cpuinfo;
    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |cc| Ok(Box::new(gui::AppState::new(cc, app, open_cpu_window)))),
    )?;
    tracing::info!("window closed");
    Ok(())
}
