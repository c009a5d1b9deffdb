//! Command implementations for the CLI.
//!
//! Each submodule implements one group of subcommands on top of a shared
//! [`MediaOperations`] built from the global options.

use anyhow::Result;
use mediaops_core::{CoreConfig, CoreConfigBuilder, MediaOperations, ShellRunner};
use std::time::Duration;

use crate::cli::Cli;

/// `locate`: where the external tools were found.
pub mod locate;

/// `classify`, `streams`, `inspect` and `preview`: read-only queries.
pub mod inspect;

/// `rotate`, `loop`, `trim` and `convert`: operations writing a new file.
pub mod transform;

/// Core configuration from `MEDIAOPS_*` variables overridden by the global flags.
pub fn build_config(cli: &Cli) -> CoreConfig {
    let mut builder = CoreConfigBuilder::from_config(CoreConfig::from_env());
    if !cli.search_dirs.is_empty() {
        builder = builder.search_dirs(cli.search_dirs.clone());
    }
    if let Some(dir) = &cli.thumbnail_dir {
        builder = builder.thumbnail_dir(dir.clone());
    }
    if let Some(secs) = cli.timeout.filter(|secs| *secs > 0) {
        builder = builder.operation_timeout(Duration::from_secs(secs));
    }
    let mut config = builder.build();
    // --timeout 0 disables a timeout set through the environment.
    if cli.timeout == Some(0) {
        config.operation_timeout = None;
    }
    config
}

/// Orchestrator running real ffmpeg/ffprobe processes.
pub fn build_operations(cli: &Cli) -> Result<MediaOperations<ShellRunner>> {
    let config = build_config(cli);
    log::debug!("Configuration: {config:?}");
    Ok(MediaOperations::with_shell(config)?)
}
