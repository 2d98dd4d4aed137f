//! Log setup: console plus one file per run under the app data `logs/` directory

use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub const DEFAULT_FILTER: &str = "savesync=info";

pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("savesync_{}.log", started.format("%Y-%m-%d_%H-%M-%S"))
}

fn open_log_file(dir: &Path, started: DateTime<Local>) -> io::Result<(PathBuf, File)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(log_file_name(started));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
/// When the log file cannot be opened, logging stays console only.
pub fn init(logs_dir: &Path) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (file_layer, opened) = match open_log_file(logs_dir, Local::now()) {
        Ok((path, file)) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            ),
            Ok(path),
        ),
        Err(e) => (None, Err(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    match opened {
        Ok(path) => tracing::debug!(file = %path.display(), "logging to file"),
        Err(e) => tracing::warn!(dir = %logs_dir.display(), "file logging disabled: {}", e),
    }
}
