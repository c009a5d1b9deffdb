// ============================================================================
// mediaops-core/src/operations/orchestrator.rs
// ============================================================================
//
// ORCHESTRATOR: Entry Points for Front-Ends
//
// MediaOperations ties the pieces together: it resolves the tools, answers
// classification / stream / preview queries for a selected file, and runs
// transform operations on worker threads while keeping one record per
// operation.
//
// KEY COMPONENTS:
// - MediaOperations: the orchestrator, generic over the ProcessRunner
// - OperationHandle: id, event channel and cancellation for a started operation
// - OperationEvent: Started / Progress / Finished messages on that channel
// - FileSelection: everything shown when a file is selected
//
// Only one transform runs at a time. Starting another while one is running
// fails with CoreError::OperationInProgress and leaves the running
// operation's record untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use chrono::Local;
use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::Serialize;

use super::{
    OperationId, OperationKind, OperationRecord, OperationStatus, build_command,
    reserve_output_path,
};
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::{
    BinaryLocator, CancellationToken, ExecutableLocation, ProcessRunner, RunOptions, RunOutcome,
    ShellRunner, Tool, resolve_tool,
};
use crate::notifications::{LogNotificationSender, NotificationSender, NotificationType};
use crate::preview::{PreviewImages, ThumbnailStore};
use crate::probe::{self, FileClassification, MediaInfoReport, MediaType};
use crate::progress::{FfmpegTextProgressV1, ProgressEvent, ProgressParser};

// ============================================================================
// PUBLIC TYPES
// ============================================================================

/// Message published on an operation's event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationEvent {
    /// The transcoder is about to be spawned.
    Started { id: OperationId, target_path: PathBuf },
    /// New progress parsed from the transcoder output.
    Progress { id: OperationId, event: ProgressEvent },
    /// The record is final. Always the last message.
    Finished { record: OperationRecord },
}

/// A started operation.
#[derive(Debug)]
pub struct OperationHandle {
    id: OperationId,
    target_path: PathBuf,
    events: Receiver<OperationEvent>,
    cancel: CancellationToken,
    join: JoinHandle<OperationRecord>,
}

impl OperationHandle {
    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Events of this operation only.
    pub fn events(&self) -> &Receiver<OperationEvent> {
        &self.events
    }

    /// Asks the worker to kill the transcoder. The record ends `cancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Blocks until the worker finishes and returns the final record.
    pub fn wait(self) -> CoreResult<OperationRecord> {
        self.join.join().map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            CoreError::WorkerPanicked(message)
        })
    }
}

/// What the front-end shows for a selected file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSelection {
    pub path: PathBuf,
    pub classification: FileClassification,
    /// Present unless the file is not media or could not be probed
    pub report: Option<MediaInfoReport>,
    /// Present for video files whose thumbnail could be created
    pub preview: Option<PathBuf>,
}

// ============================================================================
// SHARED STATE
// ============================================================================

#[derive(Debug, Default)]
struct OperationTable {
    records: BTreeMap<OperationId, OperationRecord>,
    active: Option<(OperationId, CancellationToken)>,
}

type SharedTable = Arc<Mutex<OperationTable>>;

// Workers never give up on a poisoned table; the records are plain data.
fn lock_table(table: &Mutex<OperationTable>) -> MutexGuard<'_, OperationTable> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Orchestrates probing, previews and transform operations.
pub struct MediaOperations<R: ProcessRunner + 'static> {
    config: CoreConfig,
    runner: Arc<R>,
    locator: BinaryLocator,
    previews: PreviewImages,
    notifier: Arc<dyn NotificationSender>,
    table: SharedTable,
    next_id: AtomicU64,
}

impl MediaOperations<ShellRunner> {
    /// Orchestrator spawning real processes and logging notifications.
    pub fn with_shell(config: CoreConfig) -> CoreResult<Self> {
        Self::new(config, ShellRunner::new(), Arc::new(LogNotificationSender))
    }
}

impl<R: ProcessRunner + 'static> MediaOperations<R> {
    pub fn new(
        config: CoreConfig,
        runner: R,
        notifier: Arc<dyn NotificationSender>,
    ) -> CoreResult<Self> {
        config.validate()?;
        let locator = BinaryLocator::from_config(&config);
        let previews = PreviewImages::new(
            ThumbnailStore::new(config.thumbnail_dir.clone(), config.thumbnail_width),
            config.preview_cache_capacity,
        );
        Ok(Self {
            config,
            runner: Arc::new(runner),
            locator,
            previews,
            notifier,
            table: Arc::default(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Where `tool` was found, if anywhere.
    pub fn locate(&self, tool: Tool) -> ExecutableLocation {
        self.locator.locate(tool.executable_name(&self.config))
    }

    fn tool(&self, tool: Tool) -> String {
        resolve_tool(&self.locator, &self.config, tool)
    }

    // ---- Queries on a selected file ----

    /// Classifies `path`. Never fails; see [`probe::classify_file`].
    pub fn classify(&self, path: &Path) -> FileClassification {
        probe::classify_file(self.runner.as_ref(), &self.tool(Tool::Transcoder), path)
    }

    /// Streams and container information of `path`.
    pub fn stream_info(&self, path: &Path) -> CoreResult<MediaInfoReport> {
        probe::stream_info(self.runner.as_ref(), &self.tool(Tool::Prober), path)
    }

    /// Preview image of `path`, created on first request.
    pub fn preview_image_for(&self, path: &Path) -> CoreResult<PathBuf> {
        self.previews
            .preview_image_for(self.runner.as_ref(), &self.tool(Tool::Transcoder), path)
    }

    /// Gathers classification, stream report and preview for a newly selected file.
    ///
    /// Probe and preview failures are logged and leave the field empty.
    pub fn select_file(&self, path: &Path) -> CoreResult<FileSelection> {
        if !path.is_file() {
            return Err(CoreError::FileNotFound(path.to_path_buf()));
        }

        let classification = self.classify(path);
        let report = match classification.media_type {
            MediaType::Other => None,
            MediaType::Video | MediaType::Audio => self
                .stream_info(path)
                .map_err(|e| log::warn!("Stream info unavailable for {}: {e}", path.display()))
                .ok(),
        };
        let preview = match classification.media_type {
            MediaType::Video => self
                .preview_image_for(path)
                .map_err(|e| log::warn!("Preview unavailable for {}: {e}", path.display()))
                .ok(),
            MediaType::Audio | MediaType::Other => None,
        };

        Ok(FileSelection {
            path: path.to_path_buf(),
            classification,
            report,
            preview,
        })
    }

    // ---- Operation records ----

    /// Snapshot of one operation's record.
    pub fn operation(&self, id: OperationId) -> CoreResult<OperationRecord> {
        lock_table(&self.table)
            .records
            .get(&id)
            .cloned()
            .ok_or(CoreError::UnknownOperation(id))
    }

    /// Snapshot of every record, oldest first.
    pub fn operations(&self) -> Vec<OperationRecord> {
        lock_table(&self.table).records.values().cloned().collect()
    }

    /// Operation currently running, if any.
    pub fn active_operation(&self) -> Option<OperationId> {
        lock_table(&self.table).active.as_ref().map(|(id, _)| *id)
    }

    /// Cancels `id` if it is still running.
    pub fn cancel_operation(&self, id: OperationId) -> CoreResult<()> {
        let table = lock_table(&self.table);
        if !table.records.contains_key(&id) {
            return Err(CoreError::UnknownOperation(id));
        }
        if let Some((active_id, token)) = &table.active {
            if *active_id == id {
                log::info!("Cancelling operation {id}");
                token.cancel();
            }
        }
        Ok(())
    }

    // ---- Running operations ----

    /// Starts `kind` on `source` in a worker thread.
    pub fn start_operation(&self, kind: OperationKind, source: &Path) -> CoreResult<OperationHandle> {
        kind.validate()?;
        if !source.is_file() {
            return Err(CoreError::FileNotFound(source.to_path_buf()));
        }

        let cancel = CancellationToken::new();
        let (id, target) = {
            let mut table = lock_table(&self.table);
            if let Some((active_id, _)) = &table.active {
                log::warn!("Refusing to start {kind}: operation {active_id} is still running");
                return Err(CoreError::OperationInProgress(*active_id));
            }

            let target = reserve_output_path(source, kind.suffix(), kind.output_extension())?;
            let id = OperationId(self.next_id.fetch_add(1, Ordering::SeqCst));
            let mut record = OperationRecord::new(id, kind, source.to_path_buf(), target.clone());
            record.status = OperationStatus::Running;
            table.records.insert(id, record);
            table.active = Some((id, cancel.clone()));
            (id, target)
        };

        let command = build_command(&self.tool(Tool::Transcoder), &kind, source, &target);
        log::info!("Starting {id} ({kind}): {} -> {}", source.display(), target.display());
        log::debug!("Command: {command}");

        let (events_tx, events_rx) = unbounded();
        let worker = Worker {
            id,
            kind,
            source: source.to_path_buf(),
            target: target.clone(),
            command,
            options: RunOptions {
                timeout: self.config.operation_timeout,
                cancel: Some(cancel.clone()),
            },
            runner: Arc::clone(&self.runner),
            notifier: Arc::clone(&self.notifier),
            table: Arc::clone(&self.table),
            events: events_tx,
        };

        let spawned = thread::Builder::new()
            .name(format!("mediaops-{id}"))
            .spawn(move || worker.run());
        let join = match spawned {
            Ok(join) => join,
            Err(e) => {
                if let Err(remove_err) = std::fs::remove_file(&target) {
                    log::warn!("Could not remove reserved output {}: {remove_err}", target.display());
                }
                let mut table = lock_table(&self.table);
                table.active = None;
                if let Some(record) = table.records.get_mut(&id) {
                    record.status = OperationStatus::Failed;
                    record.last_error = Some(format!("Could not start worker thread: {e}"));
                    record.finished_at = Some(Local::now());
                }
                return Err(CoreError::Io(e));
            }
        };

        Ok(OperationHandle {
            id,
            target_path: target,
            events: events_rx,
            cancel,
            join,
        })
    }

    /// Runs `kind` on `source` to completion, forwarding progress to `on_progress`.
    pub fn run_operation<F>(
        &self,
        kind: OperationKind,
        source: &Path,
        mut on_progress: F,
    ) -> CoreResult<OperationRecord>
    where
        F: FnMut(&ProgressEvent),
    {
        let handle = self.start_operation(kind, source)?;
        for event in handle.events().iter() {
            match event {
                OperationEvent::Progress { event, .. } => on_progress(&event),
                OperationEvent::Finished { .. } => break,
                OperationEvent::Started { .. } => {}
            }
        }
        handle.wait()
    }
}

// ============================================================================
// WORKER
// ============================================================================

struct Worker<R: ProcessRunner> {
    id: OperationId,
    kind: OperationKind,
    source: PathBuf,
    target: PathBuf,
    command: String,
    options: RunOptions,
    runner: Arc<R>,
    notifier: Arc<dyn NotificationSender>,
    table: SharedTable,
    events: Sender<OperationEvent>,
}

impl<R: ProcessRunner> Worker<R> {
    fn run(self) -> OperationRecord {
        let started = Instant::now();
        // A dropped receiver only means nobody is listening.
        let _ = self.events.send(OperationEvent::Started {
            id: self.id,
            target_path: self.target.clone(),
        });

        let mut parser = FfmpegTextProgressV1::new();
        let mut last_line = String::new();
        let result = self.runner.run(&self.command, &self.options, &mut |chunk: &str| {
            if let Some(line) = chunk
                .split(['\r', '\n'])
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .last()
            {
                last_line = line.to_string();
            }
            if let Some(event) = parser.ingest(chunk) {
                self.publish(event);
            }
        });

        let (status, last_error) = match result {
            Ok(RunOutcome::Exited(0)) => {
                if let Some(event) = parser.finish() {
                    self.publish(event);
                }
                (OperationStatus::Succeeded, None)
            }
            Ok(RunOutcome::Exited(code)) => {
                let mut message = format!("Transcoder exited with code {code}");
                if !last_line.is_empty() {
                    message.push_str(": ");
                    message.push_str(&last_line);
                }
                (OperationStatus::Failed, Some(message))
            }
            Ok(RunOutcome::Cancelled) => (
                OperationStatus::Cancelled,
                Some("Operation was cancelled".to_string()),
            ),
            Ok(RunOutcome::TimedOut) => {
                let limit = self.options.timeout.map(|t| t.as_secs_f64()).unwrap_or_default();
                (
                    OperationStatus::TimedOut,
                    Some(format!("Operation exceeded the {limit:.0}s time limit")),
                )
            }
            Err(e) => (OperationStatus::Failed, Some(e.to_string())),
        };

        if status != OperationStatus::Succeeded {
            self.remove_partial_output();
        }

        let record = self.finish(status, last_error);
        match record.status {
            OperationStatus::Succeeded => log::info!("{} finished: {}", self.id, self.target.display()),
            OperationStatus::Cancelled => log::info!("{} cancelled", self.id),
            _ => log::error!(
                "{} {}: {}",
                self.id,
                record.status,
                record.last_error.as_deref().unwrap_or_default()
            ),
        }

        self.notify(&record, started);
        let _ = self.events.send(OperationEvent::Finished {
            record: record.clone(),
        });
        record
    }

    /// Rescales to the expected output length and records the percentage.
    fn publish(&self, event: ProgressEvent) {
        let expected = self.kind.expected_output_seconds(event.total_seconds);
        let event = if expected > 0.0 && expected != event.total_seconds {
            ProgressEvent::compute(event.elapsed_seconds, expected)
        } else {
            event
        };

        if let Some(record) = lock_table(&self.table).records.get_mut(&self.id) {
            record.percentage = event.percentage;
        }
        log::trace!("{} at {:.2}%", self.id, event.percentage);
        let _ = self.events.send(OperationEvent::Progress { id: self.id, event });
    }

    fn finish(&self, status: OperationStatus, last_error: Option<String>) -> OperationRecord {
        let mut table = lock_table(&self.table);
        if table.active.as_ref().is_some_and(|(id, _)| *id == self.id) {
            table.active = None;
        }
        match table.records.get_mut(&self.id) {
            Some(record) => {
                record.status = status;
                record.last_error = last_error;
                if status == OperationStatus::Succeeded {
                    record.percentage = 100.0;
                }
                record.finished_at = Some(Local::now());
                record.clone()
            }
            None => {
                let mut record =
                    OperationRecord::new(self.id, self.kind, self.source.clone(), self.target.clone());
                record.status = status;
                record.last_error = last_error;
                record
            }
        }
    }

    fn remove_partial_output(&self) {
        // Reserved by start_operation, so the file at the target is ours.
        if self.target.is_file() {
            match std::fs::remove_file(&self.target) {
                Ok(()) => log::debug!("Removed partial output {}", self.target.display()),
                Err(e) => log::warn!("Could not remove partial output {}: {e}", self.target.display()),
            }
        }
    }

    fn notify(&self, record: &OperationRecord, started: Instant) {
        let action = self.kind.to_string();
        let notification = match record.status {
            OperationStatus::Succeeded => NotificationType::OperationComplete {
                id: self.id,
                action,
                source_path: self.source.clone(),
                output_path: self.target.clone(),
                elapsed: started.elapsed(),
            },
            OperationStatus::Cancelled | OperationStatus::TimedOut => {
                NotificationType::OperationCancelled {
                    id: self.id,
                    action,
                    source_path: self.source.clone(),
                    timed_out: record.status == OperationStatus::TimedOut,
                }
            }
            _ => NotificationType::OperationFailed {
                id: self.id,
                action,
                source_path: self.source.clone(),
                message: record.last_error.clone().unwrap_or_default(),
            },
        };
        if let Err(e) = self.notifier.send_notification(notification) {
            log::warn!("Failed to send notification for {}: {e}", self.id);
        }
    }
}
