//! Configuration structures and constants for the mediaops-core library.
//!
//! This module provides the configuration for tool lookup, thumbnail
//! generation and operation limits. Values come from the defaults below, the
//! builder, or `MEDIAOPS_*` environment variables.

mod builder;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub use builder::CoreConfigBuilder;

use crate::error::{CoreError, CoreResult};

// Default constants

/// Directories searched, in order, for the external tools.
///
/// Package-manager roots come before system roots so a user-installed build
/// shadows an older distribution package.
pub const DEFAULT_SEARCH_DIRS: &[&str] = &[
    "/opt/homebrew/bin",
    "/usr/local/bin",
    "/opt/local/bin",
    "/home/linuxbrew/.linuxbrew/bin",
    "/snap/bin",
    "/usr/bin",
    "/bin",
];

/// Executable name of the transcoder tool.
pub const DEFAULT_FFMPEG_NAME: &str = "ffmpeg";

/// Executable name of the prober tool.
pub const DEFAULT_FFPROBE_NAME: &str = "ffprobe";

/// Number of path -> thumbnail entries kept in memory.
pub const DEFAULT_PREVIEW_CACHE_CAPACITY: usize = 20;

/// Width in pixels of generated thumbnails (height keeps the aspect ratio).
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 320;

/// Name of the thumbnail directory created under the system temp dir.
pub const DEFAULT_THUMBNAIL_DIR_NAME: &str = "mediaops-thumbnails";

/// Environment variable holding a platform path list of search directories.
pub const ENV_SEARCH_DIRS: &str = "MEDIAOPS_SEARCH_DIRS";

/// Environment variable overriding the thumbnail directory.
pub const ENV_THUMBNAIL_DIR: &str = "MEDIAOPS_THUMBNAIL_DIR";

/// Environment variable holding an operation timeout in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "MEDIAOPS_TIMEOUT_SECS";

/// Main configuration structure for the mediaops-core library.
///
/// All fields have defaults, so `CoreConfig::default()` is usable as is.
///
/// # Examples
///
/// ```rust
/// use mediaops_core::config::CoreConfigBuilder;
/// use std::time::Duration;
///
/// let config = CoreConfigBuilder::new()
///     .search_dirs(vec!["/usr/local/bin".into()])
///     .thumbnail_dir("/tmp/thumbs")
///     .operation_timeout(Duration::from_secs(600))
///     .build();
/// assert_eq!(config.preview_cache_capacity, 20);
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Ordered directories searched for the external tools
    pub search_dirs: Vec<PathBuf>,

    /// Transcoder executable name
    pub ffmpeg_name: String,

    /// Prober executable name
    pub ffprobe_name: String,

    /// Directory where thumbnails are written, named by content hash
    pub thumbnail_dir: PathBuf,

    /// Capacity of the in-memory path -> thumbnail index
    pub preview_cache_capacity: usize,

    /// Thumbnail width in pixels
    pub thumbnail_width: u32,

    /// Kill a transform operation that runs longer than this
    pub operation_timeout: Option<Duration>,

    /// Cache successful tool lookups for the lifetime of the locator
    pub memoize_binary_lookup: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            search_dirs: DEFAULT_SEARCH_DIRS.iter().map(PathBuf::from).collect(),
            ffmpeg_name: DEFAULT_FFMPEG_NAME.to_string(),
            ffprobe_name: DEFAULT_FFPROBE_NAME.to_string(),
            thumbnail_dir: env::temp_dir().join(DEFAULT_THUMBNAIL_DIR_NAME),
            preview_cache_capacity: DEFAULT_PREVIEW_CACHE_CAPACITY,
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
            operation_timeout: None,
            memoize_binary_lookup: false,
        }
    }
}

impl CoreConfig {
    /// Default configuration with `MEDIAOPS_*` environment overrides applied.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Applies `MEDIAOPS_*` environment overrides on top of the current values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(dirs) = env::var_os(ENV_SEARCH_DIRS) {
            let parsed: Vec<PathBuf> = env::split_paths(&dirs)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            if parsed.is_empty() {
                log::warn!("{ENV_SEARCH_DIRS} is set but contains no directories, ignoring");
            } else {
                self.search_dirs = parsed;
            }
        }

        if let Some(dir) = env::var_os(ENV_THUMBNAIL_DIR) {
            if !dir.is_empty() {
                self.thumbnail_dir = PathBuf::from(dir);
            }
        }

        if let Ok(raw) = env::var(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(0) => self.operation_timeout = None,
                Ok(secs) => self.operation_timeout = Some(Duration::from_secs(secs)),
                Err(e) => log::warn!("Ignoring {ENV_TIMEOUT_SECS}={raw:?}: {e}"),
            }
        }
    }

    /// Checks the configuration for values that would make the library unusable.
    pub fn validate(&self) -> CoreResult<()> {
        if self.search_dirs.is_empty() {
            return Err(CoreError::Config("search_dirs must not be empty".to_string()));
        }
        if self.ffmpeg_name.trim().is_empty() || self.ffprobe_name.trim().is_empty() {
            return Err(CoreError::Config("tool names must not be empty".to_string()));
        }
        if self.preview_cache_capacity == 0 {
            return Err(CoreError::Config(
                "preview_cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.thumbnail_width == 0 {
            return Err(CoreError::Config("thumbnail_width must be at least 1".to_string()));
        }
        if self.operation_timeout.is_some_and(|t| t.is_zero()) {
            return Err(CoreError::Config("operation_timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}
