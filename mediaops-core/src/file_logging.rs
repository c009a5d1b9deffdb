//! File logging setup using log4rs.
//!
//! Front-ends that want a persistent log call [`setup_file_logging`] once at
//! startup instead of installing a terminal logger.

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

/// Log line layout used for log files.
pub const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";

/// Installs a global logger appending to `log_file` at `log_level`.
///
/// Fails if a logger is already installed.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(log_file)?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .build(Root::builder().appender("file").build(log_level))?;

    log4rs::init_config(config)?;

    Ok(())
}

/// Timestamped log file path inside `log_dir`, e.g. `mediaops_20250101_120000.log`.
pub fn default_log_file(log_dir: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    log_dir.join(format!("mediaops_{timestamp}.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_file_name() {
        let path = default_log_file(Path::new("/var/log/mediaops"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("mediaops_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "mediaops_20250101_120000.log".len());
        assert_eq!(path.parent().unwrap(), Path::new("/var/log/mediaops"));
    }
}
