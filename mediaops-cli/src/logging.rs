// ============================================================================
// mediaops-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Terminal or File Logging for the CLI
//
// Without --log-dir, log records go to stderr through env_logger, filtered by
// RUST_LOG when it is set:
// - default: warnings and errors only, so command output stays clean
// - --verbose: debug
//
// With --log-dir, records go to a timestamped file via the log4rs setup in
// mediaops-core instead.

use anyhow::{Context, Result};
use log::LevelFilter;
use mediaops_core::file_logging::{default_log_file, setup_file_logging};
use std::path::{Path, PathBuf};

fn level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Installs the global logger. Returns the log file path when logging to a file.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    match log_dir {
        Some(dir) => {
            let log_file = default_log_file(dir);
            // Files get info records even without --verbose.
            let file_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
            setup_file_logging(&log_file, file_level)
                .with_context(|| format!("Failed to set up logging to {}", log_file.display()))?;
            log::info!("Mediaops {} started", env!("CARGO_PKG_VERSION"));
            Ok(Some(log_file))
        }
        None => {
            env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(level(verbose).as_str()),
            )
            .format_timestamp(None)
            .init();
            log::debug!("Logger initialized with level: {}", level(verbose));
            Ok(None)
        }
    }
}
