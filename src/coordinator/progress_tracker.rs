use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::errors::{safe_task_read, safe_task_update, ClientError, TaskState};

use super::extractor_client::{ExtractionReport, ProgressReport};
use super::task::{StatusSnapshot, UploadStatus};

/// Status text rendered on settlement.
pub const STATUS_TEXT_COMPLETE: &str = "Extraction Complete";
pub const STATUS_TEXT_UPLOAD_FAILED: &str = "Upload failed.";
pub const STATUS_TEXT_CANCELLED: &str = "Upload cancelled.";

/// Publish the current task state to the presentation layer.
///
/// The watch channel keeps the latest snapshot even while no observer is
/// attached, so a late subscriber still sees the terminal state.
pub fn publish_snapshot(state: &TaskState, events: &watch::Sender<StatusSnapshot>) {
    match state.lock() {
        Ok(task) => {
            events.send_replace(task.snapshot());
        }
        Err(e) => {
            log::error!("Failed to acquire task lock for snapshot (non-critical): {}", e);
        }
    }
}

/// Check whether cancellation has been requested for this task
pub fn is_task_cancelled(state: &TaskState, task_id: Uuid) -> bool {
    safe_task_read(state, task_id, "cancellation check", |task| {
        task.status == UploadStatus::Cancelled
    })
    .unwrap_or(true) // Treat a stale or locked task as cancelled for safety
}

/// Settle the task as Succeeded with the parsed extraction report
pub fn mark_task_succeeded(
    state: &TaskState,
    events: &watch::Sender<StatusSnapshot>,
    task_id: Uuid,
    report: ExtractionReport,
) {
    safe_task_update(state, task_id, "mark succeeded", |task| {
        if task.status.is_terminal() {
            log::info!(
                "Ignoring late success for task {} - already {:?}",
                task_id,
                task.status
            );
            return;
        }

        task.status = UploadStatus::Succeeded;
        task.status_text = STATUS_TEXT_COMPLETE.to_string();
        task.current_progress = 100.0;
        task.remote_task_id = report.task_id.clone();
        task.settled_at = Some(Utc::now());

        log::info!(
            "Task {} succeeded: {} numbers extracted (remote task {:?})",
            task_id,
            report.total_numbers(),
            task.remote_task_id
        );

        task.report = Some(report);
    });

    publish_snapshot(state, events);
}

/// Settle the task as Failed, rendering status text per the error taxonomy.
///
/// A server-reported message is surfaced verbatim; transport failures get a
/// generic message with the detail kept in the log only.
pub fn mark_task_failed(
    state: &TaskState,
    events: &watch::Sender<StatusSnapshot>,
    task_id: Uuid,
    error: &ClientError,
) {
    safe_task_update(state, task_id, "mark failed", |task| {
        if task.status.is_terminal() {
            log::info!(
                "Ignoring late failure for task {} - already {:?}: {}",
                task_id,
                task.status,
                error
            );
            return;
        }

        match error {
            ClientError::ServerReported { message } => {
                task.status_text = format!("Error: {}", message);
                task.error_message = Some(message.clone());
            }
            other => {
                task.status_text = STATUS_TEXT_UPLOAD_FAILED.to_string();
                task.error_message = Some(other.to_string());
            }
        }

        task.status = UploadStatus::Failed;
        task.settled_at = Some(Utc::now());

        log::error!("Task {} failed: {}", task_id, error);
    });

    publish_snapshot(state, events);
}

/// Settle the task as Cancelled. No-op once the task is otherwise terminal.
pub fn mark_task_cancelled(
    state: &TaskState,
    events: &watch::Sender<StatusSnapshot>,
    task_id: Uuid,
) {
    safe_task_update(state, task_id, "mark cancelled", |task| {
        match task.status {
            UploadStatus::Cancelled => {} // already there, keep the original settle time
            status if status.is_terminal() => {
                log::debug!(
                    "Cancel ignored for task {} - already {:?}",
                    task_id,
                    status
                );
                return;
            }
            _ => {
                task.status = UploadStatus::Cancelled;
                task.status_text = STATUS_TEXT_CANCELLED.to_string();
                task.settled_at = Some(Utc::now());
                log::info!("Task {} marked as cancelled", task_id);
            }
        }
    });

    publish_snapshot(state, events);
}

/// Reflect a server-side progress report while the upload is in flight
pub fn record_remote_progress(
    state: &TaskState,
    events: &watch::Sender<StatusSnapshot>,
    task_id: Uuid,
    report: &ProgressReport,
) {
    let updated = safe_task_update(state, task_id, "progress update", |task| {
        if task.status.is_terminal() {
            return;
        }

        task.current_progress = report.progress.clamp(0.0, 100.0);
        task.remote_task_id = Some(report.task_id.clone());
        if !report.current_section.is_empty() {
            task.current_section = Some(report.current_section.clone());
        }

        log::debug!(
            "Task {}: {}% ({})",
            task_id,
            task.current_progress as u32,
            report.current_section
        );
    });

    if updated {
        publish_snapshot(state, events);
    }
}
