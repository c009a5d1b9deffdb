// mediaops-core/tests/utils_tests.rs

use mediaops_core::utils::{
    format_bitrate_mbps, format_bytes, format_duration, format_thousands, format_timestamp,
    parse_ffmpeg_time,
};

#[test]
fn test_clock_strings_round_trip() {
    for h in [0u32, 1, 9, 10, 99] {
        for m in [0u32, 1, 30, 59] {
            for s in [0u32, 1, 30, 59] {
                for frac in ["", ".5", ".05", ".99"] {
                    let clock = format!("{h:02}:{m:02}:{s:02}{frac}");
                    let seconds = parse_ffmpeg_time(&clock).unwrap();
                    let again = parse_ffmpeg_time(&format_timestamp(seconds)).unwrap();
                    assert!(
                        (again - seconds).abs() < 1e-9,
                        "{clock} -> {seconds} -> {again}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_parse_rejects_malformed_clocks() {
    assert_eq!(parse_ffmpeg_time("N/A"), None);
    assert_eq!(parse_ffmpeg_time("10:00"), None);
    assert_eq!(parse_ffmpeg_time("aa:bb:cc"), None);
    assert_eq!(parse_ffmpeg_time("-1:00:00"), None);
    assert_eq!(parse_ffmpeg_time("01:02:03.25"), Some(3723.25));
}

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(0.0), "00:00:00");
    assert_eq!(format_duration(59.9), "00:00:59");
    assert_eq!(format_duration(3725.0), "01:02:05");
    assert_eq!(format_duration(f64::NAN), "??:??:??");
}

#[test]
fn test_format_bytes() {
    assert_eq!(format_bytes(0), "0 B");
    assert_eq!(format_bytes(1023), "1023 B");
    assert_eq!(format_bytes(1024), "1.00 KiB");
    assert_eq!(format_bytes(1024 * 1024 * 1536 / 1024), "1.50 MiB");
    assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GiB");
}

#[test]
fn test_format_numbers() {
    assert_eq!(format_thousands(0), "0");
    assert_eq!(format_thousands(999), "999");
    assert_eq!(format_thousands(1000), "1,000");
    assert_eq!(format_thousands(7_905_432), "7,905,432");
    assert_eq!(format_bitrate_mbps(5_123_456.0), "5.12 Mbit/s");
    assert_eq!(format_bitrate_mbps(0.0), "0.00 Mbit/s");
}
