//! Console and file logging.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::{self, time::ChronoLocal};
use tracing_subscriber::prelude::*;

use crate::paths;

pub const LOG_FILE_NAME: &str = "card_ocr.log";
const TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Logs to stderr and appends to `<exe_dir>/logs/card_ocr.log`.
/// Stdout is left for the batch summary.
pub fn init(level: LevelFilter) -> Result<()> {
    let log_path = paths::get_logs_dir().join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let console = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_writer(std::io::stderr);
    let file = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(level)
        .with(console)
        .with(file)
        .try_init()
        .context("Logging was already initialized")?;
    Ok(())
}

/// `--verbose` wins; otherwise the configured level, falling back to INFO.
pub fn level_for(verbose: bool, configured: &str) -> LevelFilter {
    if verbose {
        return LevelFilter::DEBUG;
    }
    configured.parse().unwrap_or_else(|_| {
        eprintln!("Unknown log level '{}', using info", configured);
        LevelFilter::INFO
    })
}
