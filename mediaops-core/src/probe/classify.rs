// mediaops-core/src/probe/classify.rs
//
// File type classification from the transcoder's input diagnostics.
//
// Running the transcoder with only an input prints one "Stream #" line per
// stream and exits nonzero because no output was given. The exit status
// therefore says nothing; only the stream lines are inspected.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::CoreResult;
use crate::external::{ProcessRunner, quote_arg, run_collect};

/// Broad media type of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
    Other,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Video => f.write_str("video"),
            MediaType::Audio => f.write_str("audio"),
            MediaType::Other => f.write_str("other"),
        }
    }
}

/// Result of classifying one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileClassification {
    pub media_type: MediaType,
    pub has_video_stream: bool,
    pub has_audio_stream: bool,
}

impl FileClassification {
    /// Classification used when the file could not be inspected.
    #[must_use]
    pub fn other() -> Self {
        Self {
            media_type: MediaType::Other,
            has_video_stream: false,
            has_audio_stream: false,
        }
    }

    /// Video wins over audio; neither means other.
    #[must_use]
    pub fn from_streams(has_video_stream: bool, has_audio_stream: bool) -> Self {
        let media_type = if has_video_stream {
            MediaType::Video
        } else if has_audio_stream {
            MediaType::Audio
        } else {
            MediaType::Other
        };
        Self {
            media_type,
            has_video_stream,
            has_audio_stream,
        }
    }
}

/// Stream marker searched for in the diagnostic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMarker {
    Video,
    Audio,
}

impl StreamMarker {
    fn token(self) -> &'static str {
        match self {
            StreamMarker::Video => "Video:",
            StreamMarker::Audio => "Audio:",
        }
    }
}

/// Command line that makes the transcoder describe `path` and exit.
pub fn diagnostic_command(ffmpeg: &str, path: &Path) -> String {
    format!(
        "{} -hide_banner -i {}",
        quote_arg(ffmpeg),
        quote_arg(&path.to_string_lossy())
    )
}

/// Whether any stream line in `output` carries `marker`.
///
/// Embedded cover art shows up as a video stream tagged "(attached pic)" and
/// does not count as video.
#[must_use]
pub fn contains_stream_marker(output: &str, marker: StreamMarker) -> bool {
    output.lines().any(|line| {
        line.contains("Stream #")
            && line.contains(marker.token())
            && !(marker == StreamMarker::Video && line.contains("(attached pic)"))
    })
}

/// Runs the diagnostic once and reports whether `marker` appeared.
pub fn probe_marker<R: ProcessRunner + ?Sized>(
    runner: &R,
    ffmpeg: &str,
    path: &Path,
    marker: StreamMarker,
) -> CoreResult<bool> {
    let (outcome, output) = run_collect(runner, &diagnostic_command(ffmpeg, path))?;
    log::trace!("Diagnostic for {} ended with {:?}", path.display(), outcome);
    Ok(contains_stream_marker(&output, marker))
}

/// Classifies `path` by probing for a video marker and then an audio marker.
///
/// Never fails: any error while running the transcoder degrades to
/// [`FileClassification::other`].
pub fn classify_file<R: ProcessRunner + ?Sized>(
    runner: &R,
    ffmpeg: &str,
    path: &Path,
) -> FileClassification {
    let probe = |marker| probe_marker(runner, ffmpeg, path, marker);
    match (probe(StreamMarker::Video), probe(StreamMarker::Audio)) {
        (Ok(has_video), Ok(has_audio)) => {
            let classification = FileClassification::from_streams(has_video, has_audio);
            log::debug!("Classified {} as {}", path.display(), classification.media_type);
            classification
        }
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("Could not classify {}: {e}", path.display());
            FileClassification::other()
        }
    }
}
