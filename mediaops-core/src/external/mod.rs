// ============================================================================
// mediaops-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with the Transcoder and Prober Executables
//
// This module encapsulates everything that touches the external command-line
// tools: finding them on disk, spawning command lines through the shell and
// streaming their output back as text chunks.
//
// KEY COMPONENTS:
// - BinaryLocator: searches a fixed list of install directories for a tool
// - ProcessRunner: trait for running a shell command line with chunked output
// - ShellRunner: concrete runner using std::process and reader threads
// - ScriptedRunner: canned-output runner for tests (test-mocks feature)
//
// DESIGN PHILOSOPHY:
// Consumers depend on the ProcessRunner trait, not on ShellRunner, so the
// parsers and the orchestrator can be exercised without ffmpeg installed.

// ---- Internal crate imports ----
use crate::config::CoreConfig;

// ============================================================================
// SUBMODULES
// ============================================================================

/// Tool lookup over a fixed ordered list of directories
pub mod locator;

/// Spawning shell command lines and streaming their output
pub mod runner;

/// Scripted runner used by unit tests and downstream test suites
#[cfg(any(test, feature = "test-mocks"))]
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use locator::{BinaryLocator, ExecutableLocation};
pub use runner::{
    CancellationToken, ProcessRunner, RunOptions, RunOutcome, ShellRunner, run_collect,
};

// ============================================================================
// TOOL RESOLUTION
// ============================================================================

/// The two external tools this library drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Transcoder (ffmpeg)
    Transcoder,
    /// Prober (ffprobe)
    Prober,
}

impl Tool {
    /// Executable name of this tool under the given configuration.
    pub fn executable_name(self, config: &CoreConfig) -> &str {
        match self {
            Tool::Transcoder => &config.ffmpeg_name,
            Tool::Prober => &config.ffprobe_name,
        }
    }
}

/// Resolves a tool to the string embedded in command lines.
///
/// A tool that is not installed resolves to an empty string. The shell then
/// fails with its own "command not found" status, which callers see as an
/// ordinary nonzero exit.
pub fn resolve_tool(locator: &BinaryLocator, config: &CoreConfig, tool: Tool) -> String {
    let location = locator.locate(tool.executable_name(config));
    if !location.is_found() {
        log::warn!(
            "'{}' not found in {} search directories; the command will fail to start",
            location.name,
            locator.search_dirs().len()
        );
    }
    location.path.to_string_lossy().into_owned()
}

// ============================================================================
// SHELL QUOTING
// ============================================================================

/// Quotes a single argument for the platform shell.
///
/// POSIX shells get single quotes with embedded quotes escaped as `'\''`.
/// On Windows the argument is wrapped in double quotes.
pub fn quote_arg(arg: &str) -> String {
    #[cfg(windows)]
    {
        format!("\"{}\"", arg.replace('"', "\\\""))
    }
    #[cfg(not(windows))]
    {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}
