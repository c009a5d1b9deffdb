// ============================================================================
// mediaops-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// This module implements the builder pattern for the CoreConfig structure,
// providing a fluent API for creating configured instances. Every field
// starts from the CoreConfig defaults.

// ---- Standard library imports ----
use std::path::PathBuf;
use std::time::Duration;

// ---- Internal crate imports ----
use super::CoreConfig;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use mediaops_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .ffmpeg_name("ffmpeg7")
///     .preview_cache_capacity(5)
///     .memoize_binary_lookup(true)
///     .build();
/// assert_eq!(config.ffmpeg_name, "ffmpeg7");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration, e.g. one produced by `CoreConfig::from_env`.
    pub fn from_config(config: CoreConfig) -> Self {
        Self { config }
    }

    /// Sets the ordered list of tool search directories.
    pub fn search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.config.search_dirs = dirs;
        self
    }

    /// Sets the transcoder executable name.
    pub fn ffmpeg_name(mut self, name: impl Into<String>) -> Self {
        self.config.ffmpeg_name = name.into();
        self
    }

    /// Sets the prober executable name.
    pub fn ffprobe_name(mut self, name: impl Into<String>) -> Self {
        self.config.ffprobe_name = name.into();
        self
    }

    /// Sets the directory where thumbnails are stored.
    pub fn thumbnail_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.thumbnail_dir = dir.into();
        self
    }

    /// Sets the capacity of the in-memory preview index.
    pub fn preview_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.preview_cache_capacity = capacity;
        self
    }

    /// Sets the thumbnail width in pixels.
    pub fn thumbnail_width(mut self, width: u32) -> Self {
        self.config.thumbnail_width = width;
        self
    }

    /// Sets a timeout after which a running operation is killed.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.config.operation_timeout = Some(timeout);
        self
    }

    /// Enables or disables caching of tool lookups.
    pub fn memoize_binary_lookup(mut self, enable: bool) -> Self {
        self.config.memoize_binary_lookup = enable;
        self
    }

    /// Builds the CoreConfig. Call [`CoreConfig::validate`] before use when
    /// values come from user input.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}
