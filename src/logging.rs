use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::Result;
use env_logger::{Builder, Env, Target};

/// Overrides the configured `log_level`, using `env_logger` filter syntax.
pub const LOG_ENV: &str = "WORDKITE_LOG";

pub fn log_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wordkite")
        .join("wordkite.log")
}

/// Route `log` output to a file; the terminal belongs to the UI.
pub fn init(default_level: &str) -> Result<PathBuf> {
    let path = log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    Builder::from_env(Env::default().filter_or(LOG_ENV, default_level))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()?;

    log::info!("wordkite {} starting", env!("CARGO_PKG_VERSION"));
    Ok(path)
}
