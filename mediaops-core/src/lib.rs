//! Core library for media transcoding operations driven by ffmpeg and ffprobe.
//!
//! This crate locates the external tools, runs them through the shell, parses
//! their text output into progress events and stream reports, classifies
//! files, caches preview images and runs transform operations (rotate, loop,
//! trim, convert) with per-operation progress tracking.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use mediaops_core::{CoreConfig, MediaOperations, OperationKind, RotateDirection};
//! use std::path::Path;
//!
//! let ops = MediaOperations::with_shell(CoreConfig::from_env()).unwrap();
//! let clip = Path::new("/videos/clip.mp4");
//!
//! let selection = ops.select_file(clip).unwrap();
//! println!("{} is {}", clip.display(), selection.classification.media_type);
//!
//! let record = ops
//!     .run_operation(OperationKind::Rotate(RotateDirection::Right), clip, |event| {
//!         println!("{:.2}%", event.percentage);
//!     })
//!     .unwrap();
//! println!("{} -> {}", record.status, record.target_path.display());
//! ```

pub mod config;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod notifications;
pub mod operations;
pub mod preview;
pub mod probe;
pub mod progress;
pub mod utils;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{CoreError, CoreResult};
pub use external::{
    BinaryLocator, CancellationToken, ExecutableLocation, ProcessRunner, RunOptions, RunOutcome,
    ShellRunner, Tool,
};
pub use file_logging::setup_file_logging;
pub use notifications::{
    LogNotificationSender, NotificationSender, NotificationType, NullNotificationSender,
};
pub use operations::{
    FileSelection, MediaOperations, OperationEvent, OperationHandle, OperationId, OperationKind,
    OperationRecord, OperationStatus, OutputFormat, RotateDirection,
};
pub use preview::{FifoCache, PreviewImages, ThumbnailStore};
pub use probe::{
    FileClassification, FormatDescriptor, MediaInfoReport, MediaStreamDescriptor, MediaType,
    StreamKind,
};
pub use progress::{FfmpegTextProgressV1, ProgressEvent, ProgressParser};
pub use utils::{format_bytes, format_duration, format_timestamp, parse_ffmpeg_time};
