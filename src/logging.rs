use std::fs::OpenOptions;
use std::sync::Mutex;

use crate::config::LogConfig;
use crate::error::{Error, Result};

/// Install the global `tracing` subscriber from the `log` config section.
///
/// An unknown level name falls back to `error`, matching the strictest
/// useful filter rather than silencing everything.
pub fn init(config: &LogConfig) -> Result<()> {
    let level = config
        .level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::ERROR);

    if config.file.is_empty() {
        tracing_subscriber::fmt().with_max_level(level).init();
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file)
            .map_err(|e| Error::BadConfig(format!("cannot open log file {}: {e}", config.file)))?;
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}
