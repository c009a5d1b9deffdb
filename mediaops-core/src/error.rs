// ============================================================================
// mediaops-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Core Library
//
// This module defines the error type shared by every component of the core
// library, together with a result alias and small constructor helpers for the
// errors raised around external process management.
//
// KEY COMPONENTS:
// - CoreError: Enum of all error conditions surfaced by the library
// - CoreResult: Result alias using CoreError
// - command_start_error / command_wait_error: helpers for process failures

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::operations::OperationId;

/// Custom error types for mediaops-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed while waiting for command '{0}': {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("'{0}' exited with code {1}")]
    ToolFailed(String, i32),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid operation parameters: {0}")]
    InvalidOperation(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Operation {0} is still running")]
    OperationInProgress(OperationId),

    #[error("Unknown operation id {0}")]
    UnknownOperation(OperationId),

    #[error("Operation worker terminated unexpectedly: {0}")]
    WorkerPanicked(String),

    #[error("Shared state lock was poisoned: {0}")]
    StatePoisoned(&'static str),
}

/// Result type for mediaops-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Builds a [`CoreError::CommandStart`] for a command that could not be spawned.
pub fn command_start_error(command: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(command.into(), err)
}

/// Builds a [`CoreError::CommandWait`] for a command whose exit could not be collected.
pub fn command_wait_error(command: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(command.into(), err)
}
