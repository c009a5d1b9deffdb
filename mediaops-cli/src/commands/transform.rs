use anyhow::{Result, bail};
use mediaops_core::{
    MediaOperations, OperationEvent, OperationKind, OperationStatus, ShellRunner,
};
use std::path::Path;

use crate::output::{create_progress_bar, print_info, print_section, print_success};

/// Runs one transform with a progress bar. Fails unless the operation succeeded.
pub fn run_transform(
    ops: &MediaOperations<ShellRunner>,
    kind: OperationKind,
    path: &Path,
) -> Result<()> {
    let handle = ops.start_operation(kind, path)?;

    // The transcoder runs in its own process group, so Ctrl+C has to be forwarded.
    let token = handle.cancellation_token();
    ctrlc::set_handler(move || {
        if token.is_cancelled() {
            // Second Ctrl+C
            std::process::exit(130);
        }
        eprintln!("\nReceived Ctrl+C, stopping the transcoder...");
        token.cancel();
    })?;

    print_section(&kind.to_string());
    print_info("Input", path.display());
    print_info("Output", handle.target_path().display());
    println!();

    let pb = create_progress_bar("Processing")?;
    for event in handle.events().iter() {
        match event {
            // The bar cannot show overshoot; the record keeps the raw value.
            OperationEvent::Progress { event, .. } => {
                pb.set_position(event.percentage.clamp(0.0, 100.0) as u64)
            }
            OperationEvent::Finished { .. } => break,
            OperationEvent::Started { .. } => {}
        }
    }

    let record = handle.wait()?;
    match record.status {
        OperationStatus::Succeeded => {
            pb.finish_and_clear();
            print_success(&format!("Wrote {}", record.target_path.display()));
            Ok(())
        }
        status => {
            pb.abandon();
            bail!(
                "Operation {}: {}",
                status,
                record.last_error.as_deref().unwrap_or("no details")
            )
        }
    }
}
