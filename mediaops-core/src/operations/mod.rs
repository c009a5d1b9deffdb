// ============================================================================
// mediaops-core/src/operations/mod.rs
// ============================================================================
//
// TRANSFORM OPERATIONS: Kinds, Command Lines and Records
//
// This module describes the transform operations that write a new file next
// to the source (rotate, loop, trim, convert), how each one maps onto a
// transcoder command line, and the record that tracks one run.
//
// KEY COMPONENTS:
// - OperationKind: what to do, with its parameters
// - build_command: transcoder command line for a kind, source and target
// - OperationRecord / OperationStatus: per-operation state, addressed by id
// - orchestrator: MediaOperations, which runs operations and owns the records
// - output_path: collision-free output naming

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::external::quote_arg;
use crate::utils::format_timestamp;

pub mod orchestrator;
pub mod output_path;

pub use orchestrator::{FileSelection, MediaOperations, OperationEvent, OperationHandle};
pub use output_path::{derive_output_path, reserve_output_path, reserve_path};

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Identifier of one operation, unique for the lifetime of an orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

// ============================================================================
// OPERATION KINDS
// ============================================================================

/// Rotation applied by [`OperationKind::Rotate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateDirection {
    /// Half turn
    Rotate180,
    /// Quarter turn counter-clockwise
    Left,
    /// Quarter turn clockwise
    Right,
}

impl RotateDirection {
    /// Video filter implementing the rotation.
    ///
    /// `transpose=0` also flips vertically; it is kept for output compatibility
    /// with files produced by earlier releases.
    pub fn filter(self) -> &'static str {
        match self {
            RotateDirection::Rotate180 => "rotate=PI",
            RotateDirection::Left => "transpose=0",
            RotateDirection::Right => "transpose=1",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            RotateDirection::Rotate180 => "_rotate_180",
            RotateDirection::Left => "_rotate_left",
            RotateDirection::Right => "_rotate_right",
        }
    }
}

/// Target container of [`OperationKind::Convert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp4,
    Mov,
    Mkv,
    Webm,
    Gif,
    Mp3,
    Wav,
    M4a,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 8] = [
        OutputFormat::Mp4,
        OutputFormat::Mov,
        OutputFormat::Mkv,
        OutputFormat::Webm,
        OutputFormat::Gif,
        OutputFormat::Mp3,
        OutputFormat::Wav,
        OutputFormat::M4a,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Mov => "mov",
            OutputFormat::Mkv => "mkv",
            OutputFormat::Webm => "webm",
            OutputFormat::Gif => "gif",
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
            OutputFormat::M4a => "m4a",
        }
    }

    /// Whether the output carries audio only.
    pub fn is_audio_only(self) -> bool {
        matches!(self, OutputFormat::Mp3 | OutputFormat::Wav | OutputFormat::M4a)
    }

    /// Parses a format name or extension, ignoring case and a leading dot.
    pub fn from_extension(value: &str) -> Option<Self> {
        let value = value.trim_start_matches('.').to_ascii_lowercase();
        Self::ALL.into_iter().find(|format| format.extension() == value)
    }

    fn encoder_args(self) -> &'static str {
        match self {
            OutputFormat::Gif => "-vf fps=15,scale=480:-1 -loop 0",
            format if format.is_audio_only() => "-vn",
            _ => "",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A transform that writes a new file derived from the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Re-encode the video rotated.
    Rotate(RotateDirection),
    /// Play the input `count` extra times, copying streams.
    LoopVideo { count: u32 },
    /// Keep `[start_seconds, end_seconds)`, copying streams.
    Trim { start_seconds: f64, end_seconds: f64 },
    /// Re-encode into another container.
    Convert { format: OutputFormat },
}

impl OperationKind {
    /// Rejects parameters the transcoder would fail on or silently ignore.
    pub fn validate(&self) -> CoreResult<()> {
        match *self {
            OperationKind::LoopVideo { count } if count == 0 => Err(CoreError::InvalidOperation(
                "loop count must be at least 1".to_string(),
            )),
            OperationKind::Trim {
                start_seconds,
                end_seconds,
            } => {
                if !start_seconds.is_finite() || !end_seconds.is_finite() || start_seconds < 0.0 {
                    return Err(CoreError::InvalidOperation(format!(
                        "trim bounds must be finite and non-negative (got {start_seconds}..{end_seconds})"
                    )));
                }
                if start_seconds >= end_seconds {
                    return Err(CoreError::InvalidOperation(format!(
                        "trim start ({start_seconds}s) must be before end ({end_seconds}s)"
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Suffix appended to the source stem in the output name.
    pub fn suffix(&self) -> &'static str {
        match self {
            OperationKind::Rotate(direction) => direction.suffix(),
            OperationKind::LoopVideo { .. } => "_loop",
            OperationKind::Trim { .. } => "_trim",
            OperationKind::Convert { .. } => "",
        }
    }

    /// Output extension, when it differs from the source's.
    pub fn output_extension(&self) -> Option<&'static str> {
        match self {
            OperationKind::Convert { format } => Some(format.extension()),
            _ => None,
        }
    }

    /// Media seconds the output will contain, given the input duration.
    ///
    /// Used to scale progress, since the transcoder reports the input
    /// duration but output time.
    pub fn expected_output_seconds(&self, input_seconds: f64) -> f64 {
        match *self {
            OperationKind::LoopVideo { count } => input_seconds * (f64::from(count) + 1.0),
            OperationKind::Trim {
                start_seconds,
                end_seconds,
            } => (end_seconds.min(input_seconds) - start_seconds).max(0.0),
            _ => input_seconds,
        }
    }

    fn filter_args(&self) -> String {
        match *self {
            OperationKind::Rotate(direction) => format!("-vf {} -c:a copy", direction.filter()),
            OperationKind::LoopVideo { .. } => "-c copy".to_string(),
            OperationKind::Trim {
                start_seconds,
                end_seconds,
            } => format!(
                "-ss {} -to {} -c copy",
                format_timestamp(start_seconds),
                format_timestamp(end_seconds)
            ),
            OperationKind::Convert { format } => format.encoder_args().to_string(),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Rotate(RotateDirection::Rotate180) => f.write_str("rotate 180°"),
            OperationKind::Rotate(RotateDirection::Left) => f.write_str("rotate left"),
            OperationKind::Rotate(RotateDirection::Right) => f.write_str("rotate right"),
            OperationKind::LoopVideo { count } => write!(f, "loop x{}", count + 1),
            OperationKind::Trim {
                start_seconds,
                end_seconds,
            } => write!(
                f,
                "trim {}-{}",
                format_timestamp(*start_seconds),
                format_timestamp(*end_seconds)
            ),
            OperationKind::Convert { format } => write!(f, "convert to {format}"),
        }
    }
}

/// Transcoder command line for `kind`, reading `source` and writing `target`.
///
/// `target` is the empty file reserved for this operation, so `-y` lets the
/// transcoder replace it.
pub fn build_command(ffmpeg: &str, kind: &OperationKind, source: &Path, target: &Path) -> String {
    let input_args = match kind {
        OperationKind::LoopVideo { count } => format!("-stream_loop {count} "),
        _ => String::new(),
    };
    let filter_args = kind.filter_args();
    let mut command = format!(
        "{} -hide_banner -y {input_args}-i {}",
        quote_arg(ffmpeg),
        quote_arg(&source.to_string_lossy())
    );
    if !filter_args.is_empty() {
        command.push(' ');
        command.push_str(&filter_args);
    }
    command.push(' ');
    command.push_str(&quote_arg(&target.to_string_lossy()));
    command
}

// ============================================================================
// OPERATION RECORDS
// ============================================================================

/// Lifecycle of an operation: `Idle -> Running -> terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Idle,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationStatus::Succeeded
                | OperationStatus::Failed
                | OperationStatus::Cancelled
                | OperationStatus::TimedOut
        )
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OperationStatus::Idle => "idle",
            OperationStatus::Running => "running",
            OperationStatus::Succeeded => "succeeded",
            OperationStatus::Failed => "failed",
            OperationStatus::Cancelled => "cancelled",
            OperationStatus::TimedOut => "timed out",
        };
        f.write_str(text)
    }
}

/// State of one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationRecord {
    pub id: OperationId,
    pub action: OperationKind,
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    /// Latest progress, 100 once succeeded
    pub percentage: f64,
    pub status: OperationStatus,
    pub last_error: Option<String>,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
}

impl OperationRecord {
    pub(crate) fn new(id: OperationId, action: OperationKind, source_path: PathBuf, target_path: PathBuf) -> Self {
        Self {
            id,
            action,
            source_path,
            target_path,
            percentage: 0.0,
            status: OperationStatus::Idle,
            last_error: None,
            started_at: Local::now(),
            finished_at: None,
        }
    }
}
