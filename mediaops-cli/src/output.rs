//! Terminal output helpers: section headers, label/value rows, status lines
//! and the progress bar used by transform commands.

use std::fmt::Display;
use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Print a section heading
pub fn print_section(title: &str) {
    println!("\n{}", style(format!("----- {} -----", title.to_uppercase())).cyan().bold());
}

/// Print an aligned label/value row
pub fn print_info<T: Display>(label: &str, value: T) {
    println!("  {:<18} {}", style(format!("{label}:")).bold(), value);
}

/// Print label/value rows under a section heading
pub fn print_rows(title: &str, rows: &[(String, String)]) {
    print_section(title);
    for (label, value) in rows {
        print_info(label, value);
    }
}

pub fn print_success(message: &str) {
    println!("  {} {}", style("✓").green().bold(), message);
}

pub fn print_warning(message: &str) {
    eprintln!("  {} {}", style("⚠").yellow().bold(), style(message).yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), message);
}

/// Progress bar over 0..=100 percent for one operation.
pub fn create_progress_bar(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {msg} {percent:>3}% [{bar:30.cyan/blue}] ({elapsed}, ETA {eta})")?
            .progress_chars("##."),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
