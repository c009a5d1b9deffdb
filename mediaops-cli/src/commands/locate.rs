use anyhow::{Result, bail};
use console::style;
use mediaops_core::{MediaOperations, ShellRunner, Tool};

use crate::output::{print_info, print_section};

/// Prints the resolved tool paths. Fails when a tool is missing.
pub fn run_locate(ops: &MediaOperations<ShellRunner>) -> Result<()> {
    print_section("External tools");

    let mut missing = Vec::new();
    for (label, tool) in [("Transcoder", Tool::Transcoder), ("Prober", Tool::Prober)] {
        let location = ops.locate(tool);
        if location.is_found() {
            print_info(label, location.path.display());
        } else {
            print_info(label, style(format!("{} not found", location.name)).red());
            missing.push(location.name);
        }
    }

    let dirs: Vec<String> = ops
        .config()
        .search_dirs
        .iter()
        .map(|dir| dir.display().to_string())
        .collect();
    print_info("Searched", dirs.join(", "));

    if !missing.is_empty() {
        bail!("{} not found in any search directory", missing.join(", "));
    }
    Ok(())
}
