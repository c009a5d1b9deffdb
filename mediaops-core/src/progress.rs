//! Progress extraction from the transcoder's console output.
//!
//! The transcoder has no structured progress channel in the mode we drive it
//! in; it prints a `Duration:` line while opening the input and then rewrites
//! a status line containing `time=` in place (terminated by `\r`). The parser
//! turns that text into [`ProgressEvent`]s.
//!
//! # Design Decisions
//! - Parsing sits behind the [`ProgressParser`] trait with a version tag, so a
//!   parser for a different output format can be swapped in without touching
//!   the orchestrator.
//! - Only text up to the last line terminator is scanned; the unterminated
//!   tail is carried into the next chunk so markers split across two reads
//!   are still matched.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::utils::{parse_ffmpeg_time, round2};

/// Longest unterminated tail kept between chunks before it is scanned anyway.
const MAX_CARRY_BYTES: usize = 4096;

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Duration:\s*(\d+:\d{2}:\d{2}(?:\.\d+)?)").expect("duration regex pattern is invalid")
});

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\btime=\s*(\d+:\d{2}:\d{2}(?:\.\d+)?)").expect("time regex pattern is invalid")
});

/// Progress of one transcoder invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// Media time processed so far
    pub elapsed_seconds: f64,
    /// Media duration reported by the first `Duration:` line
    pub total_seconds: f64,
    /// `elapsed / total * 100` rounded to two decimals, not clamped
    pub percentage: f64,
    /// Estimated seconds remaining; absent while percentage is 0
    pub eta_seconds: Option<f64>,
}

impl ProgressEvent {
    /// Derives percentage and ETA from elapsed and total seconds.
    ///
    /// `total_seconds` must be positive.
    #[must_use]
    pub fn compute(elapsed_seconds: f64, total_seconds: f64) -> Self {
        let percentage = round2(elapsed_seconds / total_seconds * 100.0);
        let eta_seconds = (percentage > 0.0)
            .then(|| elapsed_seconds * (100.0 - percentage) / percentage)
            .filter(|eta| eta.is_finite());
        Self {
            elapsed_seconds,
            total_seconds,
            percentage,
            eta_seconds,
        }
    }
}

/// Incremental parser over one invocation's output stream.
///
/// Create a fresh parser per invocation.
pub trait ProgressParser: Send {
    /// Identifies the output format this parser understands.
    fn version(&self) -> &'static str;

    /// Feeds one chunk of output. Returns the newest event derived from it, if any.
    fn ingest(&mut self, chunk: &str) -> Option<ProgressEvent>;

    /// Scans whatever unterminated text is left once the process has exited.
    fn finish(&mut self) -> Option<ProgressEvent>;

    /// Total duration, once known.
    fn total_seconds(&self) -> Option<f64>;

    /// Most recent event produced so far.
    fn last_event(&self) -> Option<ProgressEvent>;
}

/// Parser for ffmpeg's human-readable `Duration:` / `time=` console lines.
#[derive(Debug, Default)]
pub struct FfmpegTextProgressV1 {
    total_seconds: Option<f64>,
    last_event: Option<ProgressEvent>,
    carry: String,
}

impl FfmpegTextProgressV1 {
    pub fn new() -> Self {
        Self::default()
    }

    fn scan(&mut self, text: &str) -> Option<ProgressEvent> {
        // Later Duration lines (e.g. a second input or a restart) are ignored.
        if self.total_seconds.is_none() {
            self.total_seconds = DURATION_RE
                .captures_iter(text)
                .find_map(|caps| parse_ffmpeg_time(&caps[1]));
            if let Some(total) = self.total_seconds {
                log::debug!("Input duration: {total:.2}s");
            }
        }

        let total = self.total_seconds.filter(|t| *t > 0.0)?;
        let elapsed = TIME_RE
            .captures_iter(text)
            .filter_map(|caps| parse_ffmpeg_time(&caps[1]))
            .last()?;

        let event = ProgressEvent::compute(elapsed, total);
        self.last_event = Some(event);
        Some(event)
    }
}

impl ProgressParser for FfmpegTextProgressV1 {
    fn version(&self) -> &'static str {
        "ffmpeg-text/1"
    }

    fn ingest(&mut self, chunk: &str) -> Option<ProgressEvent> {
        self.carry.push_str(chunk);

        let ready = match self.carry.rfind(|c| c == '\r' || c == '\n') {
            Some(idx) => {
                let rest = self.carry.split_off(idx + 1);
                std::mem::replace(&mut self.carry, rest)
            }
            None if self.carry.len() > MAX_CARRY_BYTES => std::mem::take(&mut self.carry),
            None => return None,
        };

        self.scan(&ready)
    }

    fn finish(&mut self) -> Option<ProgressEvent> {
        let rest = std::mem::take(&mut self.carry);
        if rest.is_empty() {
            return None;
        }
        self.scan(&rest)
    }

    fn total_seconds(&self) -> Option<f64> {
        self.total_seconds
    }

    fn last_event(&self) -> Option<ProgressEvent> {
        self.last_event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'clip.mp4':\n  Duration: 00:10:00.00, start: 0.000000, bitrate: 5000 kb/s\n";

    #[test]
    fn test_half_way_is_fifty_percent() {
        let mut parser = FfmpegTextProgressV1::new();
        assert!(parser.ingest("  Duration: 00:10:00, start: 0.0\n").is_none());
        let event = parser.ingest("frame=  100 time=00:05:00 bitrate=1.0kbits/s\r").unwrap();
        assert_eq!(event.percentage, 50.0);
        assert_eq!(event.total_seconds, 600.0);
        assert_eq!(event.elapsed_seconds, 300.0);
        assert_eq!(event.eta_seconds, Some(300.0));
    }

    #[test]
    fn test_zero_percent_has_no_eta() {
        let mut parser = FfmpegTextProgressV1::new();
        parser.ingest(HEADER);
        let event = parser.ingest("frame=    0 time=00:00:00.00 bitrate=N/A\r").unwrap();
        assert_eq!(event.percentage, 0.0);
        assert_eq!(event.eta_seconds, None);
    }

    #[test]
    fn test_tiny_progress_never_produces_non_finite_values() {
        let event = ProgressEvent::compute(0.001, 36_000.0);
        assert_eq!(event.percentage, 0.0);
        assert!(event.eta_seconds.is_none());
        assert!(event.percentage.is_finite());
    }

    #[test]
    fn test_time_before_duration_is_ignored() {
        let mut parser = FfmpegTextProgressV1::new();
        assert!(parser.ingest("time=00:00:05.00\n").is_none());
        assert!(parser.total_seconds().is_none());
        parser.ingest(HEADER);
        assert!(parser.ingest("time=00:01:00.00\r").is_some());
    }

    #[test]
    fn test_first_duration_wins() {
        let mut parser = FfmpegTextProgressV1::new();
        parser.ingest(HEADER);
        parser.ingest("  Duration: 00:20:00.00, start: 0.0\n");
        assert_eq!(parser.total_seconds(), Some(600.0));
        let event = parser.ingest("time=00:06:00.00\r").unwrap();
        assert_eq!(event.percentage, 60.0);
    }

    #[test]
    fn test_percentage_is_rounded_and_recomputed() {
        let mut parser = FfmpegTextProgressV1::new();
        parser.ingest("Duration: 00:00:03.00\n");
        assert_eq!(parser.ingest("time=00:00:01.00\r").unwrap().percentage, 33.33);
        assert_eq!(parser.ingest("time=00:00:02.00\r").unwrap().percentage, 66.67);
        assert_eq!(parser.last_event().unwrap().elapsed_seconds, 2.0);
    }

    #[test]
    fn test_last_time_in_chunk_is_used() {
        let mut parser = FfmpegTextProgressV1::new();
        parser.ingest(HEADER);
        let event = parser
            .ingest("time=00:01:00.00 speed=2x\rtime=00:02:00.00 speed=2x\r")
            .unwrap();
        assert_eq!(event.elapsed_seconds, 120.0);
    }

    #[test]
    fn test_marker_split_across_chunks() {
        let mut parser = FfmpegTextProgressV1::new();
        assert!(parser.ingest("  Durat").is_none());
        assert!(parser.ingest("ion: 00:10:00.00, start").is_none());
        assert!(parser.ingest(": 0.0\nframe=1 ti").is_none());
        assert_eq!(parser.total_seconds(), Some(600.0));
        assert!(parser.ingest("me=00:0").is_none());
        let event = parser.ingest("2:30.00 bitrate=1\r").unwrap();
        assert_eq!(event.percentage, 25.0);
    }

    #[test]
    fn test_finish_flushes_unterminated_tail() {
        let mut parser = FfmpegTextProgressV1::new();
        parser.ingest(HEADER);
        assert!(parser.ingest("time=00:10:00.00").is_none());
        let event = parser.finish().unwrap();
        assert_eq!(event.percentage, 100.0);
        assert!(parser.finish().is_none());
    }

    #[test]
    fn test_overshoot_is_not_clamped() {
        let mut parser = FfmpegTextProgressV1::new();
        parser.ingest("Duration: 00:00:10.00\n");
        let event = parser.ingest("time=00:00:10.05\r").unwrap();
        assert_eq!(event.percentage, 100.5);
    }

    #[test]
    fn test_zero_duration_produces_no_events() {
        let mut parser = FfmpegTextProgressV1::new();
        parser.ingest("Duration: 00:00:00.00\n");
        assert!(parser.ingest("time=00:00:01.00\r").is_none());
    }

    #[test]
    fn test_out_time_and_na_values_are_skipped() {
        let mut parser = FfmpegTextProgressV1::new();
        parser.ingest("Duration: N/A, bitrate: N/A\n");
        assert!(parser.total_seconds().is_none());
        parser.ingest(HEADER);
        assert!(parser.ingest("out_time=00:05:00.00\n").is_none());
        assert!(parser.ingest("time=N/A bitrate=N/A\r").is_none());
    }

    #[test]
    fn test_long_unterminated_output_is_bounded() {
        let mut parser = FfmpegTextProgressV1::new();
        parser.ingest(HEADER);
        let noise = "x".repeat(MAX_CARRY_BYTES);
        assert!(parser.ingest(&noise).is_none());
        let event = parser.ingest(" time=00:01:00.00").unwrap();
        assert_eq!(event.elapsed_seconds, 60.0);
    }

    #[test]
    fn test_version_tag() {
        assert_eq!(FfmpegTextProgressV1::new().version(), "ffmpeg-text/1");
    }
}
