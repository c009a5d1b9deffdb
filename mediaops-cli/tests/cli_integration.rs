use assert_cmd::Command;
use predicates::str::contains;
use std::error::Error;
use std::path::Path;
use tempfile::tempdir;

// Helper function to get the path to the compiled binary
fn mediaops_cmd() -> Command {
    let mut cmd = Command::cargo_bin("mediaops").expect("Failed to find mediaops binary");
    cmd.env_remove("MEDIAOPS_SEARCH_DIRS")
        .env_remove("MEDIAOPS_THUMBNAIL_DIR")
        .env_remove("MEDIAOPS_TIMEOUT_SECS")
        .env_remove("MEDIAOPS_LOG_DIR");
    cmd
}

fn with_search_dir(cmd: &mut Command, dir: &Path) {
    cmd.arg("--search-dir").arg(dir);
}

#[test]
fn test_help_lists_subcommands() {
    mediaops_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("classify"))
        .stdout(contains("rotate"))
        .stdout(contains("convert"));
}

#[test]
fn test_classify_non_existent_file() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;

    let mut cmd = mediaops_cmd();
    with_search_dir(&mut cmd, dir.path());
    cmd.arg("classify")
        .arg(dir.path().join("missing.mp4"))
        .assert()
        .failure()
        .stderr(contains("File not found"));

    Ok(())
}

#[test]
fn test_locate_reports_missing_tools() -> Result<(), Box<dyn Error>> {
    let empty = tempdir()?;

    let mut cmd = mediaops_cmd();
    with_search_dir(&mut cmd, empty.path());
    cmd.arg("locate")
        .assert()
        .failure()
        .stderr(contains("not found in any search directory"));

    Ok(())
}

#[test]
fn test_trim_rejects_inverted_range() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("clip.mp4");
    std::fs::write(&input, "dummy content")?;

    let mut cmd = mediaops_cmd();
    with_search_dir(&mut cmd, dir.path());
    cmd.arg("trim")
        .arg(&input)
        .args(["--start", "00:00:05", "--end", "2"])
        .assert()
        .failure()
        .stderr(contains("must be before end"));

    Ok(())
}

#[test]
fn test_convert_rejects_unknown_format() {
    mediaops_cmd()
        .args(["convert", "clip.mp4", "avi"])
        .assert()
        .failure()
        .stderr(contains("unsupported format"));
}

#[test]
fn test_loop_rejects_zero_count() {
    mediaops_cmd()
        .args(["loop", "clip.mp4", "--count", "0"])
        .assert()
        .failure();
}

#[cfg(unix)]
mod with_fake_tools {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    const FAKE_FFMPEG: &str = r#"#!/bin/sh
for last; do :; done
if [ "$2" = "-i" ]; then
  echo "Input #0, mp3, from '$3':" >&2
  echo "  Stream #0:0: Audio: mp3, 44100 Hz, stereo, fltp, 128 kb/s" >&2
  echo "At least one output file must be specified" >&2
  exit 1
fi
echo "  Duration: 00:00:04.00, start: 0.000000, bitrate: 128 kb/s" >&2
printf 'frame=2 time=00:00:04.00 bitrate=1\r' >&2
: > "$last"
exit 0
"#;

    const FAKE_FFPROBE: &str = r#"#!/bin/sh
cat <<'EOF'
[STREAM]
index=0
codec_name=h264
codec_type=video
width=640
height=360
[/STREAM]
[STREAM]
index=1
codec_name=aac
codec_type=audio
sample_rate=44100
[/STREAM]
[FORMAT]
format_name=mov,mp4,m4a,3gp,3g2,mj2
duration=4.000000
[/FORMAT]
EOF
"#;

    fn install_script(dir: &Path, name: &str, body: &str) -> Result<(), Box<dyn Error>> {
        let path = dir.join(name);
        fs::write(&path, body)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(())
    }

    /// Temp dir with `bin/ffmpeg`, `bin/ffprobe` and an input file `name`.
    fn setup(name: &str) -> Result<(TempDir, std::path::PathBuf), Box<dyn Error>> {
        let temp = TempDir::new()?;
        let bin = temp.path().join("bin");
        fs::create_dir(&bin)?;
        install_script(&bin, "ffmpeg", FAKE_FFMPEG)?;
        install_script(&bin, "ffprobe", FAKE_FFPROBE)?;
        let input = temp.path().join(name);
        fs::write(&input, "dummy content")?;
        Ok((temp, input))
    }

    fn cmd_for(temp: &TempDir) -> Command {
        let mut cmd = mediaops_cmd();
        with_search_dir(&mut cmd, &temp.path().join("bin"));
        cmd.arg("--thumbnail-dir").arg(temp.path().join("thumbs"));
        cmd
    }

    #[test]
    fn test_locate_finds_tools() -> Result<(), Box<dyn Error>> {
        let (temp, _) = setup("song.mp3")?;
        cmd_for(&temp)
            .arg("locate")
            .assert()
            .success()
            .stdout(contains("ffmpeg"))
            .stdout(contains("ffprobe"));
        Ok(())
    }

    #[test]
    fn test_classify_audio_file() -> Result<(), Box<dyn Error>> {
        let (temp, input) = setup("song.mp3")?;
        cmd_for(&temp)
            .arg("classify")
            .arg(&input)
            .assert()
            .success()
            .stdout(contains("audio"));
        Ok(())
    }

    #[test]
    fn test_streams_json() -> Result<(), Box<dyn Error>> {
        let (temp, input) = setup("clip.mp4")?;
        let output = cmd_for(&temp)
            .arg("streams")
            .arg(&input)
            .arg("--json")
            .output()?;
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        let streams = report["streams"].as_array().expect("streams array");
        assert_eq!(streams.len(), 2);
        Ok(())
    }

    #[test]
    fn test_rotate_writes_output() -> Result<(), Box<dyn Error>> {
        let (temp, input) = setup("clip.mp4")?;
        cmd_for(&temp)
            .arg("rotate")
            .arg(&input)
            .arg("left")
            .assert()
            .success()
            .stdout(contains("Wrote"));

        let written: Vec<_> = fs::read_dir(temp.path())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("clip") && name != "clip.mp4")
            .collect();
        assert_eq!(written.len(), 1, "unexpected outputs: {written:?}");
        Ok(())
    }
}
