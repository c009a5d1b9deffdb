// mediaops-cli/src/main.rs
//
// Entry point of the `mediaops` binary.
//
// Responsibilities:
// - Parsing command-line arguments.
// - Setting up logging to stderr or to a log file.
// - Building the mediaops-core orchestrator from the environment and flags.
// - Dispatching to the subcommand implementations.
// - Reporting errors and setting the process exit code.

use anyhow::Result;
use clap::Parser;
use mediaops_cli::commands::{inspect, locate, transform};
use mediaops_cli::logging::init_logging;
use mediaops_cli::output::print_error;
use mediaops_cli::{Cli, Commands, build_operations};
use mediaops_core::OperationKind;
use std::process;

fn run(cli: Cli) -> Result<()> {
    let log_file = init_logging(cli.verbose, cli.log_dir.as_deref())?;
    if let Some(log_file) = &log_file {
        eprintln!("Logging to {}", log_file.display());
    }

    let ops = build_operations(&cli)?;
    match cli.command {
        Commands::Locate => locate::run_locate(&ops),
        Commands::Classify { path } => inspect::run_classify(&ops, &path),
        Commands::Streams { path, json } => inspect::run_streams(&ops, &path, json),
        Commands::Inspect { path } => inspect::run_inspect(&ops, &path),
        Commands::Preview { path } => inspect::run_preview(&ops, &path),
        Commands::Rotate { path, direction } => {
            transform::run_transform(&ops, OperationKind::Rotate(direction.into()), &path)
        }
        Commands::Loop { path, count } => {
            transform::run_transform(&ops, OperationKind::LoopVideo { count }, &path)
        }
        Commands::Trim { path, start, end } => transform::run_transform(
            &ops,
            OperationKind::Trim {
                start_seconds: start,
                end_seconds: end,
            },
            &path,
        ),
        Commands::Convert { path, format } => {
            transform::run_transform(&ops, OperationKind::Convert { format }, &path)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{e:#}");
        print_error(&format!("{e:#}"));
        process::exit(1);
    }
}
