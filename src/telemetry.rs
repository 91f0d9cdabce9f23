//! Log output.
//!
//! The terminal is owned by the interface, so logs only ever go to a file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to open log file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install tracing subscriber")]
    Init(#[from] TryInitError),
}

/// Install a global subscriber writing to `log_file` at `level`, unless
/// `RUST_LOG` says otherwise.
///
/// Returns `false` without installing anything when there is no log file.
pub fn init(log_file: Option<&Path>, level: Level) -> Result<bool, TelemetryError> {
    let Some(path) = log_file else {
        return Ok(false);
    };

    let file = open(path)?;
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(fmt_layer)
        .try_init()?;

    Ok(true)
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

fn open(path: &Path) -> Result<File, TelemetryError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TelemetryError::Open {
            path: path.to_path_buf(),
            source,
        })
}
