// mediaops-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// Compiled for this crate's unit tests and, behind the "test-mocks" feature,
// for downstream test suites.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use super::runner::{ProcessRunner, RunOptions, RunOutcome};
use crate::error::{CoreError, CoreResult};

/// Canned behaviour for one matched command line.
#[derive(Clone, Debug)]
pub struct ScriptedResponse {
    /// Chunks delivered to the callback, in order
    pub chunks: Vec<String>,
    /// Outcome returned once the chunks are delivered
    pub outcome: RunOutcome,
    /// Write placeholder bytes to the last quoted argument (the output path)
    pub create_output: bool,
    /// Block after the chunks until a message arrives or the run is cancelled
    pub wait_for: Option<Receiver<()>>,
}

impl ScriptedResponse {
    /// Response that emits `chunks` and exits with `code`.
    pub fn exit(code: i32, chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            outcome: RunOutcome::Exited(code),
            create_output: false,
            wait_for: None,
        }
    }

    /// Also creates the output file named by the command line.
    pub fn creating_output(mut self) -> Self {
        self.create_output = true;
        self
    }

    /// Blocks until `release` receives a message (or is dropped).
    pub fn waiting_for(mut self, release: Receiver<()>) -> Self {
        self.wait_for = Some(release);
        self
    }
}

enum Expectation {
    Respond(ScriptedResponse),
    SpawnError(String),
}

/// Mock implementation of ProcessRunner matching command lines by substring.
///
/// Expectations are checked in insertion order and are reusable. A command
/// line matching no expectation exits with 127, like a shell that could not
/// find the program.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    expectations: Arc<Mutex<Vec<(String, Expectation)>>>,
    received_calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Default::default()
    }

    /// Responds to command lines containing `pattern` with `response`.
    pub fn expect(&self, pattern: &str, response: ScriptedResponse) {
        if let Ok(mut expectations) = self.expectations.lock() {
            expectations.push((pattern.to_string(), Expectation::Respond(response)));
        }
    }

    /// Fails to spawn command lines containing `pattern`.
    pub fn expect_spawn_error(&self, pattern: &str, message: &str) {
        if let Ok(mut expectations) = self.expectations.lock() {
            expectations.push((pattern.to_string(), Expectation::SpawnError(message.to_string())));
        }
    }

    /// Every command line received so far.
    pub fn received_calls(&self) -> Vec<String> {
        self.received_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(
        &self,
        command_line: &str,
        options: &RunOptions,
        on_chunk: &mut dyn FnMut(&str),
    ) -> CoreResult<RunOutcome> {
        if let Ok(mut calls) = self.received_calls.lock() {
            calls.push(command_line.to_string());
        }

        let matched = {
            let expectations = self
                .expectations
                .lock()
                .map_err(|_| CoreError::StatePoisoned("scripted runner expectations"))?;
            expectations
                .iter()
                .find(|(pattern, _)| command_line.contains(pattern.as_str()))
                .map(|(_, expectation)| match expectation {
                    Expectation::Respond(response) => Ok(response.clone()),
                    Expectation::SpawnError(message) => Err(message.clone()),
                })
        };

        let response = match matched {
            Some(Ok(response)) => response,
            Some(Err(message)) => {
                return Err(CoreError::CommandStart(
                    command_line.to_string(),
                    std::io::Error::other(message),
                ));
            }
            None => {
                log::debug!("No scripted response for: {command_line}");
                return Ok(RunOutcome::Exited(127));
            }
        };

        for chunk in &response.chunks {
            on_chunk(chunk);
        }

        if let Some(release) = &response.wait_for {
            let started = Instant::now();
            loop {
                match release.recv_timeout(Duration::from_millis(10)) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
                if options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                    return Ok(RunOutcome::Cancelled);
                }
                if options.timeout.is_some_and(|t| started.elapsed() >= t) {
                    return Ok(RunOutcome::TimedOut);
                }
            }
        }

        if response.create_output {
            if let Some(path) = last_quoted_arg(command_line) {
                std::fs::write(&path, b"scripted output")?;
            }
        }

        Ok(response.outcome)
    }
}

fn last_quoted_arg(command_line: &str) -> Option<PathBuf> {
    let quote = if cfg!(windows) { '"' } else { '\'' };
    let end = command_line.rfind(quote)?;
    let start = command_line[..end].rfind(quote)?;
    Some(PathBuf::from(&command_line[start + 1..end]))
}
