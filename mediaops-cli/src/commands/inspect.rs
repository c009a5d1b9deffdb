use anyhow::Result;
use mediaops_core::{
    CoreError, FileClassification, MediaInfoReport, MediaOperations, ShellRunner,
};
use std::path::Path;

use crate::output::{print_info, print_rows, print_section, print_success, print_warning};

fn ensure_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(CoreError::FileNotFound(path.to_path_buf()).into());
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn print_classification(classification: &FileClassification) {
    print_section("File type");
    print_info("Type", classification.media_type);
    print_info("Video stream", yes_no(classification.has_video_stream));
    print_info("Audio stream", yes_no(classification.has_audio_stream));
}

fn print_report(report: &MediaInfoReport) {
    if report.streams.is_empty() {
        print_warning("No audio or video streams found");
    }
    for section in report.sections() {
        print_rows(&section.title, &section.rows);
    }
}

pub fn run_classify(ops: &MediaOperations<ShellRunner>, path: &Path) -> Result<()> {
    ensure_file(path)?;
    print_classification(&ops.classify(path));
    Ok(())
}

pub fn run_streams(ops: &MediaOperations<ShellRunner>, path: &Path, json: bool) -> Result<()> {
    ensure_file(path)?;
    let report = ops.stream_info(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

pub fn run_inspect(ops: &MediaOperations<ShellRunner>, path: &Path) -> Result<()> {
    let selection = ops.select_file(path)?;
    print_classification(&selection.classification);
    if let Some(report) = &selection.report {
        print_report(report);
    }
    if let Some(preview) = &selection.preview {
        print_section("Preview");
        print_info("Thumbnail", preview.display());
    }
    Ok(())
}

pub fn run_preview(ops: &MediaOperations<ShellRunner>, path: &Path) -> Result<()> {
    ensure_file(path)?;
    let image = ops.preview_image_for(path)?;
    print_success(&format!("Preview: {}", image.display()));
    Ok(())
}
