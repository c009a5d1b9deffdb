//! Utility functions for time and number formatting.
//!
//! This module provides the small conversions shared by the progress parser,
//! the stream info renderer and the CLI: ffmpeg clock strings to seconds and
//! back, byte and bit rate formatting, and thousands separators.

/// Parses an FFmpeg clock string (HH:MM:SS or HH:MM:SS.ff) to seconds. Returns None if invalid.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<f64> {
    let parts: Vec<&str> = time.trim().split(':').collect();
    if parts.len() == 3 {
        let hours = parts[0].parse::<u64>().ok()? as f64;
        let minutes = parts[1].parse::<u64>().ok()? as f64;
        let seconds = parts[2].parse::<f64>().ok()?;
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        Some(hours * 3600.0 + minutes * 60.0 + seconds)
    } else {
        None
    }
}

/// Formats seconds as an FFmpeg clock string with hundredths (e.g., 3725.5 -> "01:02:05.50").
///
/// Output of this function always parses back with [`parse_ffmpeg_time`] to the
/// same value at hundredth precision. Returns "00:00:00.00" for invalid inputs.
#[must_use]
pub fn format_timestamp(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "00:00:00.00".to_string();
    }

    let total_hundredths = (seconds * 100.0).round() as u64;
    let hours = total_hundredths / 360_000;
    let minutes = (total_hundredths % 360_000) / 6000;
    let secs = (total_hundredths % 6000) / 100;
    let hundredths = total_hundredths % 100;
    format!("{hours:02}:{minutes:02}:{secs:02}.{hundredths:02}")
}

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Inserts comma thousands separators (e.g., 1234567 -> "1,234,567").
#[must_use]
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats a bit rate in bits per second as Mbit/s with two decimals.
#[must_use]
pub fn format_bitrate_mbps(bits_per_second: f64) -> String {
    if !bits_per_second.is_finite() || bits_per_second < 0.0 {
        return "0.00 Mbit/s".to_string();
    }
    format!("{:.2} Mbit/s", bits_per_second / 1_000_000.0)
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
