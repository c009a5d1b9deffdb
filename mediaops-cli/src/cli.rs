// mediaops-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand, ValueEnum};
use mediaops_core::utils::parse_ffmpeg_time;
use mediaops_core::{OutputFormat, RotateDirection};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Mediaops: media inspection and transcoding toolkit",
    long_about = "Inspects media files and runs rotate, loop, trim and convert operations \
                  using ffmpeg/ffprobe via the mediaops-core library."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to a timestamped file in this directory instead of stderr
    #[arg(long, global = true, value_name = "LOG_DIR", env = "MEDIAOPS_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Directory searched for ffmpeg/ffprobe; repeat to give several, in order (replaces the defaults)
    #[arg(long = "search-dir", global = true, value_name = "DIR")]
    pub search_dirs: Vec<PathBuf>,

    /// Directory where preview thumbnails are stored
    #[arg(long, global = true, value_name = "DIR")]
    pub thumbnail_dir: Option<PathBuf>,

    /// Kill transform operations running longer than this many seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show where ffmpeg and ffprobe were found
    Locate,

    /// Classify a file as video, audio or other
    Classify {
        /// File to classify
        path: PathBuf,
    },

    /// List the audio and video streams of a file
    Streams {
        /// File to inspect
        path: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a file and show its streams and preview, as when selecting it
    Inspect {
        /// File to inspect
        path: PathBuf,
    },

    /// Create (or reuse) the preview thumbnail of a video file
    Preview {
        /// Video file
        path: PathBuf,
    },

    /// Rotate a video
    Rotate {
        /// Video file
        path: PathBuf,

        /// Rotation to apply
        #[arg(value_enum)]
        direction: RotateArg,
    },

    /// Repeat a video by copying its streams
    Loop {
        /// Video file
        path: PathBuf,

        /// Extra repetitions after the first play
        #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,
    },

    /// Cut a section out of a file by copying its streams
    Trim {
        /// Media file
        path: PathBuf,

        /// Start time (seconds or HH:MM:SS[.ff])
        #[arg(long, value_parser = parse_time)]
        start: f64,

        /// End time (seconds or HH:MM:SS[.ff])
        #[arg(long, value_parser = parse_time)]
        end: f64,
    },

    /// Convert a file to another container
    Convert {
        /// Media file
        path: PathBuf,

        /// Target format (mp4, mov, mkv, webm, gif, mp3, wav, m4a)
        #[arg(value_parser = parse_format)]
        format: OutputFormat,
    },
}

/// Rotation names accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotateArg {
    /// Half turn
    #[value(name = "180")]
    Half,
    /// Quarter turn counter-clockwise
    Left,
    /// Quarter turn clockwise
    Right,
}

impl From<RotateArg> for RotateDirection {
    fn from(arg: RotateArg) -> Self {
        match arg {
            RotateArg::Half => RotateDirection::Rotate180,
            RotateArg::Left => RotateDirection::Left,
            RotateArg::Right => RotateDirection::Right,
        }
    }
}

/// Parses plain seconds or an ffmpeg clock string.
pub fn parse_time(value: &str) -> Result<f64, String> {
    let seconds = value
        .trim()
        .parse::<f64>()
        .ok()
        .or_else(|| parse_ffmpeg_time(value))
        .ok_or_else(|| format!("invalid time '{value}', expected seconds or HH:MM:SS[.ff]"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("time must be a non-negative number of seconds, got '{value}'"));
    }
    Ok(seconds)
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_extension(value).ok_or_else(|| {
        let known: Vec<&str> = OutputFormat::ALL.iter().map(|f| f.extension()).collect();
        format!("unsupported format '{value}' (expected one of {})", known.join(", "))
    })
}
