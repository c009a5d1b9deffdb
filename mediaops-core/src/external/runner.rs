// ============================================================================
// mediaops-core/src/external/runner.rs
// ============================================================================
//
// PROCESS RUNNER: Shell Command Execution with Streamed Output
//
// This module spawns command lines through the platform shell and delivers
// their standard output and standard error, merged, to a single callback as
// text chunks. A chunk is whatever one read returned, so it may end in the
// middle of a line.
//
// KEY COMPONENTS:
// - ProcessRunner: trait seam used by the classifier, prober and orchestrator
// - ShellRunner: std::process implementation with one reader thread per pipe
// - RunOptions / CancellationToken: timeout and cancellation of a running child
// - RunOutcome: exit code, or the reason the child was killed
//
// A nonzero exit status is reported as `RunOutcome::Exited(code)`, never as
// an error. Only failing to spawn the shell is an `Err`.

use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, Sender};

use crate::error::{CoreResult, command_start_error, command_wait_error};

/// Size of a single read from a child pipe.
const READ_BUFFER_SIZE: usize = 8192;

/// How often the runner checks cancellation and timeout while output is quiet.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// OPTIONS AND OUTCOMES
// ============================================================================

/// Shared flag used to ask a running command to stop.
///
/// Clones share the same flag, so a token handed to a runner can be cancelled
/// from any thread that holds a clone.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Limits applied to a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Kill the child once it has run this long
    pub timeout: Option<Duration>,
    /// Kill the child once this token is cancelled
    pub cancel: Option<CancellationToken>,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The child exited on its own. Signal termination is reported as -1.
    Exited(i32),
    /// The child was killed after its cancellation token fired.
    Cancelled,
    /// The child was killed after exceeding the timeout.
    TimedOut,
}

impl RunOutcome {
    /// Exit code, if the child exited on its own.
    #[must_use]
    pub fn exit_code(self) -> Option<i32> {
        match self {
            RunOutcome::Exited(code) => Some(code),
            RunOutcome::Cancelled | RunOutcome::TimedOut => None,
        }
    }

    /// Whether the child exited with status 0.
    #[must_use]
    pub fn success(self) -> bool {
        self == RunOutcome::Exited(0)
    }
}

// ============================================================================
// RUNNER TRAIT
// ============================================================================

/// Trait representing something that can run a shell command line.
pub trait ProcessRunner: Send + Sync {
    /// Runs `command_line`, passing every chunk of merged stdout/stderr text to
    /// `on_chunk`, and returns how the process ended.
    fn run(
        &self,
        command_line: &str,
        options: &RunOptions,
        on_chunk: &mut dyn FnMut(&str),
    ) -> CoreResult<RunOutcome>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for Arc<R> {
    fn run(
        &self,
        command_line: &str,
        options: &RunOptions,
        on_chunk: &mut dyn FnMut(&str),
    ) -> CoreResult<RunOutcome> {
        (**self).run(command_line, options, on_chunk)
    }
}

/// Runs a command line without limits and returns its outcome with all output concatenated.
pub fn run_collect<R: ProcessRunner + ?Sized>(
    runner: &R,
    command_line: &str,
) -> CoreResult<(RunOutcome, String)> {
    let mut output = String::new();
    let outcome = runner.run(command_line, &RunOptions::default(), &mut |chunk: &str| {
        output.push_str(chunk)
    })?;
    Ok((outcome, output))
}

// ============================================================================
// SHELL RUNNER
// ============================================================================

/// Concrete [`ProcessRunner`] that spawns `sh -c` (or `cmd /C` on Windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    /// Creates a new shell runner.
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for ShellRunner {
    fn run(
        &self,
        command_line: &str,
        options: &RunOptions,
        on_chunk: &mut dyn FnMut(&str),
    ) -> CoreResult<RunOutcome> {
        log::debug!("Running: {command_line}");

        let mut child = shell_command(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                log::error!("Failed to spawn shell for '{command_line}': {e}");
                command_start_error(command_line, e)
            })?;

        let (tx, rx) = crossbeam_channel::unbounded::<String>();
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, tx.clone());
        }
        drop(tx);

        let started = Instant::now();
        let mut stopped = None;
        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(text) => on_chunk(&strip_escapes(&text)),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let cancelled = options.cancel.as_ref().is_some_and(CancellationToken::is_cancelled);
            let timed_out = options.timeout.is_some_and(|limit| started.elapsed() >= limit);
            if cancelled || timed_out {
                let reason = if cancelled {
                    RunOutcome::Cancelled
                } else {
                    RunOutcome::TimedOut
                };
                log::warn!("Stopping '{command_line}': {reason:?}");
                kill_tree(&mut child);
                stopped = Some(reason);
                break;
            }
        }

        let status = child.wait().map_err(|e| command_wait_error(command_line, e))?;
        if let Some(reason) = stopped {
            return Ok(reason);
        }

        let code = status.code().unwrap_or(-1);
        log::debug!("Command exited with code {code}: {command_line}");
        Ok(RunOutcome::Exited(code))
    }
}

/// Shell invocation for `command_line`.
///
/// On unix the shell leads a new process group so that [`kill_tree`] reaches
/// the tool it forks as well as the shell itself.
fn shell_command(command_line: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command_line);
        cmd
    }
    #[cfg(not(windows))]
    {
        use std::os::unix::process::CommandExt;
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command_line).process_group(0);
        cmd
    }
}

/// Kills the shell and every process it started.
fn kill_tree(child: &mut Child) {
    let pid = child.id().to_string();
    #[cfg(windows)]
    let killed = Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    #[cfg(not(windows))]
    let killed = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -KILL -{pid}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match killed {
        Ok(status) if status.success() => {}
        Ok(status) => log::debug!("Killing process tree {pid} exited with {status}"),
        Err(e) => log::debug!("Could not kill process tree {pid}: {e}"),
    }
    // The group kill may race with the child's own exit; this covers the shell either way.
    if let Err(e) = child.kill() {
        log::debug!("Kill failed (child may have exited already): {e}");
    }
}

/// Reads a pipe until EOF, forwarding decoded text over `tx`.
///
/// Bytes of a UTF-8 sequence split across two reads are held back until the
/// sequence is complete.
fn spawn_reader<R: Read + Send + 'static>(mut source: R, tx: Sender<String>) {
    thread::spawn(move || {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let mut pending: Vec<u8> = Vec::new();
        loop {
            match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    pending.extend_from_slice(&buf[..n]);
                    let text = take_decodable(&mut pending);
                    if !text.is_empty() && tx.send(text).is_err() {
                        return;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("Output reader stopped: {e}");
                    break;
                }
            }
        }
        if !pending.is_empty() {
            let _ = tx.send(String::from_utf8_lossy(&pending).into_owned());
        }
    });
}

fn take_decodable(pending: &mut Vec<u8>) -> String {
    let valid_up_to = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => pending.len(),
    };
    let tail = pending.split_off(valid_up_to);
    let text = String::from_utf8_lossy(pending).into_owned();
    *pending = tail;
    text
}

/// Removes ANSI escape sequences while keeping the `\r` that terminates
/// in-place progress lines.
fn strip_escapes(text: &str) -> String {
    if !text.contains('\x1b') {
        return text.to_string();
    }
    text.split('\r')
        .map(strip_ansi_escapes::strip_str)
        .collect::<Vec<_>>()
        .join("\r")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_decodable_holds_partial_sequence() {
        // "é" is 0xC3 0xA9
        let mut pending = vec![b'a', b'b', 0xC3];
        assert_eq!(take_decodable(&mut pending), "ab");
        assert_eq!(pending, vec![0xC3]);

        pending.push(0xA9);
        assert_eq!(take_decodable(&mut pending), "é");
        assert!(pending.is_empty());
    }

    #[test]
    fn test_take_decodable_replaces_invalid_bytes() {
        let mut pending = vec![b'a', 0xFF, b'b'];
        assert_eq!(take_decodable(&mut pending), "a\u{FFFD}b");
        assert!(pending.is_empty());
    }

    #[test]
    fn test_strip_escapes_keeps_carriage_returns() {
        let raw = "\x1b[1;32mframe=1\x1b[0m time=00:00:01.00\rframe=2\n";
        assert_eq!(strip_escapes(raw), "frame=1 time=00:00:01.00\rframe=2\n");
        assert_eq!(strip_escapes("plain\rtext"), "plain\rtext");
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(RunOutcome::Exited(0).success());
        assert!(!RunOutcome::Exited(1).success());
        assert!(!RunOutcome::Cancelled.success());
        assert_eq!(RunOutcome::Exited(127).exit_code(), Some(127));
        assert_eq!(RunOutcome::TimedOut.exit_code(), None);
    }

    #[test]
    fn test_cancellation_token_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_runner_merges_streams_and_reports_exit_code() {
        let (outcome, output) =
            run_collect(&ShellRunner::new(), "printf out; printf err 1>&2; exit 3").unwrap();
        assert_eq!(outcome, RunOutcome::Exited(3));
        assert!(output.contains("out"));
        assert!(output.contains("err"));
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_runner_missing_command_is_not_an_error() {
        let (outcome, _) = run_collect(&ShellRunner::new(), "'' -version").unwrap();
        assert!(matches!(outcome, RunOutcome::Exited(code) if code != 0));
    }

    /// Installs a script shaped like the transcoder: it writes its last
    /// argument after a delay, unless it is killed first.
    #[cfg(unix)]
    fn slow_tool(dir: &std::path::Path) -> (String, std::path::PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let tool = dir.join("ffmpeg");
        std::fs::write(&tool, "#!/bin/sh\nfor last; do :; done\nsleep 1\n: > \"$last\"\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let output = dir.join("out.mp4");
        let command = format!(
            "'{}' -hide_banner -y -i '{}' '{}'",
            tool.display(),
            dir.join("in.mp4").display(),
            output.display()
        );
        (command, output)
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_runner_timeout_kills_child() {
        let temp = tempfile::TempDir::new().unwrap();
        let (command, output) = slow_tool(temp.path());
        let options = RunOptions {
            timeout: Some(Duration::from_millis(200)),
            cancel: None,
        };
        let started = Instant::now();
        let outcome = ShellRunner::new().run(&command, &options, &mut |_: &str| {}).unwrap();
        assert_eq!(outcome, RunOutcome::TimedOut);
        assert!(started.elapsed() < Duration::from_millis(900));

        thread::sleep(Duration::from_millis(1500));
        assert!(!output.exists(), "tool kept running after the timeout");
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_runner_honours_cancellation() {
        let temp = tempfile::TempDir::new().unwrap();
        let (command, output) = slow_tool(temp.path());
        let token = CancellationToken::new();
        let options = RunOptions {
            timeout: None,
            cancel: Some(token.clone()),
        };
        let canceller = {
            let token = token.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(150));
                token.cancel();
            })
        };
        let outcome = ShellRunner::new().run(&command, &options, &mut |_: &str| {}).unwrap();
        canceller.join().unwrap();
        assert_eq!(outcome, RunOutcome::Cancelled);

        thread::sleep(Duration::from_millis(1500));
        assert!(!output.exists(), "tool kept running after cancellation");
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_runner_lets_quoted_tool_finish() {
        let temp = tempfile::TempDir::new().unwrap();
        let (command, output) = slow_tool(temp.path());
        let (outcome, _) = run_collect(&ShellRunner::new(), &command).unwrap();
        assert_eq!(outcome, RunOutcome::Exited(0));
        assert!(output.is_file());
    }
}
