// ============================================================================
// mediaops-core/src/probe/stream_info.rs
// ============================================================================
//
// STREAM INFO PARSER: Prober Block Output to Stream Descriptors
//
// The prober (run with -show_streams -show_format) writes one block per
// stream and one for the container:
//
//   [STREAM]
//   index=0
//   codec_name=h264
//   codec_type=video
//   width=1920
//   ...
//   [/STREAM]
//   [FORMAT]
//   format_name=mov,mp4,m4a,3gp,3g2,mj2
//   ...
//   [/FORMAT]
//
// Blocks are parsed into flat key/value maps. Values that look numeric are
// stored as numbers, everything else as text. Only video and audio streams
// are kept, in the order the prober printed them.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A single value from a `key=value` line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProbeValue {
    Number(f64),
    Text(String),
}

impl ProbeValue {
    /// Parses a raw value, keeping anything that is not a plain finite number as text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let numeric_chars = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
            && trimmed.chars().any(|c| c.is_ascii_digit());
        if numeric_chars {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return ProbeValue::Number(n);
                }
            }
        }
        ProbeValue::Text(trimmed.to_string())
    }

    /// Numeric value, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ProbeValue::Number(n) => Some(*n),
            ProbeValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ProbeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            ProbeValue::Number(n) => write!(f, "{n}"),
            ProbeValue::Text(s) => f.write_str(s),
        }
    }
}

/// Flat key/value map of one block.
pub type ProbeBlock = BTreeMap<String, ProbeValue>;

/// Kind of media stream kept by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Video => f.write_str("Video"),
            StreamKind::Audio => f.write_str("Audio"),
        }
    }
}

/// Summary of one audio or video stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaStreamDescriptor {
    pub kind: StreamKind,
    /// `codec_name`, or "unknown"
    pub codec_name: String,
    /// "WIDTHxHEIGHT" for video, "RATE Hz" for audio, empty if missing
    pub resolution_or_sample_rate: String,
    /// `bit_rate` in bits per second, 0 when missing
    pub bit_rate_bits: f64,
    /// `duration` in seconds, 0 when missing
    pub duration_seconds: f64,
    /// Every other key of the block
    pub extra_fields: ProbeBlock,
}

/// Container-level information from the `[FORMAT]` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatDescriptor {
    pub format_name: String,
    pub format_long_name: Option<String>,
    pub duration_seconds: f64,
    pub size_bytes: u64,
    pub bit_rate_bits: f64,
}

const CONSUMED_STREAM_KEYS: &[&str] = &[
    "codec_type",
    "codec_name",
    "width",
    "height",
    "sample_rate",
    "bit_rate",
    "duration",
];

/// Splits prober output into the key/value maps of every complete `[tag]` block.
///
/// A block missing its closing line is dropped.
#[must_use]
pub fn parse_blocks(text: &str, tag: &str) -> Vec<ProbeBlock> {
    let open = format!("[{tag}]");
    let close = format!("[/{tag}]");

    let mut blocks = Vec::new();
    let mut current: Option<ProbeBlock> = None;
    for line in text.lines() {
        let line = line.trim();
        if line == open {
            current = Some(BTreeMap::new());
        } else if line == close {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
        } else if let Some(block) = current.as_mut() {
            if let Some((key, value)) = line.split_once('=') {
                block.insert(key.trim().to_string(), ProbeValue::parse(value));
            }
        }
    }
    blocks
}

/// Parses every video and audio `[STREAM]` block, in source order.
#[must_use]
pub fn parse_streams(text: &str) -> Vec<MediaStreamDescriptor> {
    parse_blocks(text, "STREAM")
        .into_iter()
        .filter_map(descriptor_from_block)
        .collect()
}

/// Parses the first `[FORMAT]` block, if present.
#[must_use]
pub fn parse_format(text: &str) -> Option<FormatDescriptor> {
    let block = parse_blocks(text, "FORMAT").into_iter().next()?;
    Some(FormatDescriptor {
        format_name: text_field(&block, "format_name").unwrap_or_else(|| "unknown".to_string()),
        format_long_name: text_field(&block, "format_long_name"),
        duration_seconds: number_or_zero(&block, "duration"),
        size_bytes: number_or_zero(&block, "size").max(0.0) as u64,
        bit_rate_bits: number_or_zero(&block, "bit_rate"),
    })
}

fn descriptor_from_block(mut block: ProbeBlock) -> Option<MediaStreamDescriptor> {
    let kind = match block.get("codec_type") {
        Some(ProbeValue::Text(t)) if t == "video" => StreamKind::Video,
        Some(ProbeValue::Text(t)) if t == "audio" => StreamKind::Audio,
        _ => return None,
    };

    let codec_name = text_field(&block, "codec_name").unwrap_or_else(|| "unknown".to_string());
    let resolution_or_sample_rate = match kind {
        StreamKind::Video => {
            match (
                block.get("width").and_then(ProbeValue::as_f64),
                block.get("height").and_then(ProbeValue::as_f64),
            ) {
                (Some(w), Some(h)) => format!("{}x{}", w as u64, h as u64),
                _ => String::new(),
            }
        }
        StreamKind::Audio => block
            .get("sample_rate")
            .and_then(ProbeValue::as_f64)
            .map(|rate| format!("{} Hz", rate as u64))
            .unwrap_or_default(),
    };
    let bit_rate_bits = number_or_zero(&block, "bit_rate");
    let duration_seconds = number_or_zero(&block, "duration");

    for key in CONSUMED_STREAM_KEYS {
        block.remove(*key);
    }

    Some(MediaStreamDescriptor {
        kind,
        codec_name,
        resolution_or_sample_rate,
        bit_rate_bits,
        duration_seconds,
        extra_fields: block,
    })
}

fn text_field(block: &ProbeBlock, key: &str) -> Option<String> {
    block
        .get(key)
        .map(ToString::to_string)
        .filter(|value| !value.is_empty())
}

fn number_or_zero(block: &ProbeBlock, key: &str) -> f64 {
    block.get(key).and_then(ProbeValue::as_f64).unwrap_or(0.0)
}
