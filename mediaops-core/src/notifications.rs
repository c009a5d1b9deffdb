// ============================================================================
// mediaops-core/src/notifications.rs
// ============================================================================
//
// NOTIFICATIONS: Operation Outcome Notifications
//
// The orchestrator reports the end of every transform operation through a
// NotificationSender. Front-ends plug in their own sender (a desktop toast,
// a status line); the library ships one that logs and one that does nothing.
//
// KEY COMPONENTS:
// - NotificationType: Enum of operation outcomes
// - NotificationSender: Trait for delivering notifications
// - LogNotificationSender: Writes notifications to the log
// - NullNotificationSender: No-op implementation

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::operations::OperationId;
use crate::utils::format_duration;

// ============================================================================
// NOTIFICATION TYPES
// ============================================================================

/// Outcome of an operation worth telling the user about.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationType {
    /// The output file was written
    OperationComplete {
        id: OperationId,
        action: String,
        source_path: PathBuf,
        output_path: PathBuf,
        elapsed: Duration,
    },

    /// The transcoder could not be started or exited nonzero
    OperationFailed {
        id: OperationId,
        action: String,
        source_path: PathBuf,
        message: String,
    },

    /// The operation was cancelled or hit the configured timeout
    OperationCancelled {
        id: OperationId,
        action: String,
        source_path: PathBuf,
        timed_out: bool,
    },
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

impl NotificationType {
    pub fn title(&self) -> String {
        match self {
            NotificationType::OperationComplete { .. } => "Operation Complete".to_string(),
            NotificationType::OperationFailed { .. } => "Operation Failed".to_string(),
            NotificationType::OperationCancelled { timed_out: true, .. } => {
                "Operation Timed Out".to_string()
            }
            NotificationType::OperationCancelled { .. } => "Operation Cancelled".to_string(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            NotificationType::OperationComplete {
                action,
                source_path,
                output_path,
                elapsed,
                ..
            } => format!(
                "{} of {} finished in {}: {}",
                action,
                file_name(source_path),
                format_duration(elapsed.as_secs_f64()),
                output_path.display()
            ),
            NotificationType::OperationFailed {
                action,
                source_path,
                message,
                ..
            } => format!("{} of {} failed: {}", action, file_name(source_path), message),
            NotificationType::OperationCancelled {
                action,
                source_path,
                timed_out,
                ..
            } => {
                let reason = if *timed_out { "timed out" } else { "was cancelled" };
                format!("{} of {} {}", action, file_name(source_path), reason)
            }
        }
    }

    /// Operation the notification is about.
    pub fn operation_id(&self) -> OperationId {
        match self {
            NotificationType::OperationComplete { id, .. }
            | NotificationType::OperationFailed { id, .. }
            | NotificationType::OperationCancelled { id, .. } => *id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, NotificationType::OperationFailed { .. })
    }
}

// ============================================================================
// NOTIFICATION SENDER
// ============================================================================

/// Trait for delivering notifications.
///
/// Called from the operation's worker thread after its record is final.
pub trait NotificationSender: Send + Sync {
    fn send_notification(&self, notification: NotificationType) -> Result<(), String>;
}

/// Writes each notification to the log at info level (warn for failures).
#[derive(Debug, Clone, Default)]
pub struct LogNotificationSender;

impl NotificationSender for LogNotificationSender {
    fn send_notification(&self, notification: NotificationType) -> Result<(), String> {
        if notification.is_error() {
            log::warn!("{}: {}", notification.title(), notification.message());
        } else {
            log::info!("{}: {}", notification.title(), notification.message());
        }
        Ok(())
    }
}

/// No-op implementation of NotificationSender.
#[derive(Debug, Clone, Default)]
pub struct NullNotificationSender;

impl NotificationSender for NullNotificationSender {
    fn send_notification(&self, _notification: NotificationType) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_message() {
        let notification = NotificationType::OperationComplete {
            id: OperationId(1),
            action: "rotate left".to_string(),
            source_path: PathBuf::from("/videos/clip.mp4"),
            output_path: PathBuf::from("/videos/clip_rotate_left.mp4"),
            elapsed: Duration::from_secs(65),
        };
        assert_eq!(notification.title(), "Operation Complete");
        assert_eq!(
            notification.message(),
            "rotate left of clip.mp4 finished in 00:01:05: /videos/clip_rotate_left.mp4"
        );
        assert!(!notification.is_error());
        assert_eq!(notification.operation_id(), OperationId(1));
    }

    #[test]
    fn test_cancelled_titles() {
        let cancelled = |timed_out| NotificationType::OperationCancelled {
            id: OperationId(2),
            action: "trim".to_string(),
            source_path: PathBuf::from("clip.mp4"),
            timed_out,
        };
        assert_eq!(cancelled(true).title(), "Operation Timed Out");
        assert_eq!(cancelled(false).title(), "Operation Cancelled");
        assert_eq!(cancelled(false).message(), "trim of clip.mp4 was cancelled");
    }

    #[test]
    fn test_senders_accept_notifications() {
        let failed = NotificationType::OperationFailed {
            id: OperationId(3),
            action: "convert to gif".to_string(),
            source_path: PathBuf::from("clip.mp4"),
            message: "exit code 1".to_string(),
        };
        assert!(failed.is_error());
        assert!(LogNotificationSender.send_notification(failed.clone()).is_ok());
        assert!(NullNotificationSender.send_notification(failed).is_ok());
    }
}
