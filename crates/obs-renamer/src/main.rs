//! OBS Renamer: watches OBS Studio and asks for a name for every finished
//! recording.

mod app;
mod app_command;
mod config;
mod console;
mod error;
#[cfg(test)]
mod tests;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
};

use crate::{config::Config, console::Console};

use std::{io, time::Duration};

use obs_renamer_core::ObsConnector;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "obs_renamer=debug,obs_renamer_core=debug";

/// Application entry point.
fn main() {
    let _log_guard = match init_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up logging: {e}");
            std::process::exit(1);
        }
    };

    let config_path = match Config::default_path() {
        Ok(path) => path,
        Err(e) => {
            error!(error = ?e, "Failed to locate config directory");
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let config = match Config::load_from(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(error = ?e, "Failed to load config");
            eprintln!("Failed to load {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = ?e, "Failed to create tokio runtime");
            std::process::exit(1);
        }
    };

    let result = rt.block_on(async {
        let (line_tx, line_rx) = mpsc::channel(16);
        let _reader = console::spawn_stdin_reader(line_tx);

        let app = App::new(
            ObsConnector::new(),
            config,
            config_path,
            Console::new(io::stdout()),
        );
        app.run(line_rx).await
    });

    if let Err(e) = result {
        error!(error = ?e, "App error");
        eprintln!("{e}");
    }

    // Stdin reads park a blocking thread that never returns on its own.
    rt.shutdown_timeout(Duration::from_secs(1));
    info!("Exited");
}

/// Log to a daily rolling file so log lines never interleave with the
/// console. `RUST_LOG` overrides the default filter.
fn init_logging() -> AppResult<WorkerGuard> {
    let log_dir = Config::log_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, "obs-renamer.log"));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
