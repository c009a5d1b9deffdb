// ============================================================================
// mediaops-core/src/probe/mod.rs
// ============================================================================
//
// MEDIA PROBING: Classification and Stream Reports
//
// This module answers two questions about a file without modifying it: what
// kind of media it is, and which audio/video streams it contains.
//
// KEY COMPONENTS:
// - classify: FileTypeClassifier over the transcoder's input diagnostics
// - stream_info: parser for the prober's [STREAM] / [FORMAT] blocks
// - MediaInfoReport: parsed streams plus display sections for front-ends

use std::path::Path;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::external::{ProcessRunner, quote_arg, run_collect};
use crate::utils::{format_bitrate_mbps, format_bytes, format_duration, format_thousands};

pub mod classify;
pub mod stream_info;

pub use classify::{FileClassification, MediaType, classify_file};
pub use stream_info::{
    FormatDescriptor, MediaStreamDescriptor, ProbeValue, StreamKind, parse_format, parse_streams,
};

/// Extra stream fields shown in the report, in display order.
const VIDEO_DETAIL_FIELDS: &[(&str, &str)] = &[
    ("r_frame_rate", "Frame Rate"),
    ("pix_fmt", "Pixel Format"),
    ("profile", "Profile"),
];
const AUDIO_DETAIL_FIELDS: &[(&str, &str)] = &[
    ("channels", "Channels"),
    ("channel_layout", "Channel Layout"),
    ("sample_fmt", "Sample Format"),
];

/// Streams and container information of one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfoReport {
    pub streams: Vec<MediaStreamDescriptor>,
    pub format: Option<FormatDescriptor>,
}

/// Titled list of label/value rows ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamSection {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl MediaInfoReport {
    /// Parses complete prober output.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            streams: parse_streams(text),
            format: parse_format(text),
        }
    }

    /// Streams of one kind, in source order.
    pub fn streams_of(&self, kind: StreamKind) -> impl Iterator<Item = &MediaStreamDescriptor> {
        self.streams.iter().filter(move |s| s.kind == kind)
    }

    /// One section per stream in source order, followed by the container section.
    #[must_use]
    pub fn sections(&self) -> Vec<StreamSection> {
        let mut video_count = 0;
        let mut audio_count = 0;
        let mut sections: Vec<StreamSection> = self
            .streams
            .iter()
            .map(|stream| {
                let number = match stream.kind {
                    StreamKind::Video => {
                        video_count += 1;
                        video_count
                    }
                    StreamKind::Audio => {
                        audio_count += 1;
                        audio_count
                    }
                };
                stream_section(stream, number)
            })
            .collect();

        if let Some(format) = &self.format {
            sections.push(format_section(format));
        }
        sections
    }
}

fn stream_section(stream: &MediaStreamDescriptor, number: usize) -> StreamSection {
    let (dimension_label, details) = match stream.kind {
        StreamKind::Video => ("Resolution", VIDEO_DETAIL_FIELDS),
        StreamKind::Audio => ("Sample Rate", AUDIO_DETAIL_FIELDS),
    };

    let mut rows = vec![("Codec".to_string(), stream.codec_name.clone())];
    if !stream.resolution_or_sample_rate.is_empty() {
        rows.push((dimension_label.to_string(), stream.resolution_or_sample_rate.clone()));
    }
    rows.push(("Bit Rate".to_string(), bitrate_text(stream.bit_rate_bits)));
    rows.push(("Duration".to_string(), duration_text(stream.duration_seconds)));
    for (key, label) in details {
        if let Some(value) = stream.extra_fields.get(*key) {
            rows.push((label.to_string(), value.to_string()));
        }
    }

    StreamSection {
        title: format!("{} Stream #{number}", stream.kind),
        rows,
    }
}

fn format_section(format: &FormatDescriptor) -> StreamSection {
    let container = format
        .format_long_name
        .clone()
        .unwrap_or_else(|| format.format_name.clone());
    StreamSection {
        title: "Container".to_string(),
        rows: vec![
            ("Format".to_string(), container),
            ("Duration".to_string(), duration_text(format.duration_seconds)),
            (
                "Size".to_string(),
                format!(
                    "{} bytes ({})",
                    format_thousands(format.size_bytes),
                    format_bytes(format.size_bytes)
                ),
            ),
            ("Bit Rate".to_string(), bitrate_text(format.bit_rate_bits)),
        ],
    }
}

fn bitrate_text(bits: f64) -> String {
    format!(
        "{} ({} bit/s)",
        format_bitrate_mbps(bits),
        format_thousands(bits.max(0.0) as u64)
    )
}

fn duration_text(seconds: f64) -> String {
    format!("{} ({seconds:.2} s)", format_duration(seconds))
}

#[cfg(windows)]
const DISCARD_STDERR: &str = "2>NUL";
#[cfg(not(windows))]
const DISCARD_STDERR: &str = "2>/dev/null";

/// Command line that makes the prober print stream and container blocks.
///
/// The runner merges both pipes, so stderr is discarded to keep diagnostics
/// from landing inside a `key=value` line.
pub fn probe_command(ffprobe: &str, path: &Path) -> String {
    format!(
        "{} -v error -show_streams -show_format {} {DISCARD_STDERR}",
        quote_arg(ffprobe),
        quote_arg(&path.to_string_lossy())
    )
}

/// Runs the prober on `path` and parses its output.
///
/// A nonzero exit (unreadable file, missing prober) is reported as
/// [`CoreError::ToolFailed`].
pub fn stream_info<R: ProcessRunner + ?Sized>(
    runner: &R,
    ffprobe: &str,
    path: &Path,
) -> CoreResult<MediaInfoReport> {
    let (outcome, output) = run_collect(runner, &probe_command(ffprobe, path))?;
    if !outcome.success() {
        let code = outcome.exit_code().unwrap_or(-1);
        log::warn!("Prober failed on {} with exit code {code}", path.display());
        log::debug!("Prober output: {}", output.trim());
        return Err(CoreError::ToolFailed(ffprobe.to_string(), code));
    }

    let report = MediaInfoReport::parse(&output);
    log::debug!(
        "{} has {} video and {} audio stream(s)",
        path.display(),
        report.streams_of(StreamKind::Video).count(),
        report.streams_of(StreamKind::Audio).count()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mocks::{ScriptedResponse, ScriptedRunner};

    const PROBE_OUTPUT: &str = "[STREAM]\nindex=0\ncodec_name=h264\ncodec_type=video\nwidth=1280\nheight=720\nr_frame_rate=25/1\nbit_rate=2500000\nduration=10.000000\n[/STREAM]\n[STREAM]\nindex=1\ncodec_name=aac\ncodec_type=audio\nsample_rate=44100\nchannels=2\nbit_rate=128000\nduration=10.000000\n[/STREAM]\n[FORMAT]\nformat_name=mov,mp4,m4a,3gp,3g2,mj2\nduration=10.000000\nsize=3281920\nbit_rate=2625536\n[/FORMAT]\n";

    #[test]
    fn test_sections_follow_stream_order() {
        let report = MediaInfoReport::parse(PROBE_OUTPUT);
        let sections = report.sections();
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Video Stream #1", "Audio Stream #1", "Container"]);
    }

    #[test]
    fn test_section_rows() {
        let report = MediaInfoReport::parse(PROBE_OUTPUT);
        let sections = report.sections();

        let video = &sections[0].rows;
        assert_eq!(video[0], ("Codec".to_string(), "h264".to_string()));
        assert_eq!(video[1], ("Resolution".to_string(), "1280x720".to_string()));
        assert_eq!(
            video[2],
            ("Bit Rate".to_string(), "2.50 Mbit/s (2,500,000 bit/s)".to_string())
        );
        assert_eq!(video[3], ("Duration".to_string(), "00:00:10 (10.00 s)".to_string()));
        assert_eq!(video[4], ("Frame Rate".to_string(), "25/1".to_string()));

        let audio = &sections[1].rows;
        assert_eq!(audio[1], ("Sample Rate".to_string(), "44100 Hz".to_string()));
        assert!(audio.contains(&("Channels".to_string(), "2".to_string())));

        let container = &sections[2].rows;
        assert_eq!(
            container[2],
            ("Size".to_string(), "3,281,920 bytes (3.13 MiB)".to_string())
        );
    }

    #[test]
    fn test_stream_info_runs_prober() {
        let runner = ScriptedRunner::new();
        runner.expect("-show_streams", ScriptedResponse::exit(0, &[PROBE_OUTPUT]));
        let report = stream_info(&runner, "/usr/bin/ffprobe", Path::new("clip.mp4")).unwrap();
        assert_eq!(report.streams.len(), 2);
        assert!(report.format.is_some());
        assert!(runner.received_calls()[0].contains("-v error -show_streams -show_format"));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_prober_command_discards_stderr() {
        assert_eq!(
            probe_command("/usr/bin/ffprobe", Path::new("/v/clip.mp4")),
            "'/usr/bin/ffprobe' -v error -show_streams -show_format '/v/clip.mp4' 2>/dev/null"
        );
    }

    #[test]
    fn test_stream_info_failure_is_reported() {
        let runner = ScriptedRunner::new();
        runner.expect(
            "-show_streams",
            ScriptedResponse::exit(1, &["clip.mp4: No such file or directory\n"]),
        );
        let err = stream_info(&runner, "/usr/bin/ffprobe", Path::new("clip.mp4")).unwrap_err();
        assert!(matches!(err, CoreError::ToolFailed(_, 1)));
    }

    #[test]
    fn test_file_without_media_streams_has_no_stream_sections() {
        let report = MediaInfoReport::parse("[FORMAT]\nformat_name=tty\n[/FORMAT]\n");
        let sections = report.sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Container");
    }
}
