use std::path::PathBuf;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::errors::{ClientError, TaskState};

use super::extractor_client::{ExtractorClient, UploadOutcome, UploadPayload};
use super::progress_tracker::{
    is_task_cancelled, mark_task_cancelled, mark_task_failed, mark_task_succeeded,
};
use super::task::StatusSnapshot;

/// Drive one accepted submission from dispatch to settlement.
///
/// Runs as a spawned task; the coordinator has already transitioned the task
/// to InFlight before this starts. Every exit path settles the task exactly
/// once, and a cancellation observed at any point wins over whatever the
/// transport eventually returned.
pub async fn run_submission(
    client: ExtractorClient,
    file_path: PathBuf,
    state: TaskState,
    events: watch::Sender<StatusSnapshot>,
    task_id: Uuid,
    cancel: CancellationToken,
) {
    // Initial cancellation check
    if is_task_cancelled(&state, task_id) {
        log::info!("Task {} was cancelled before dispatch", task_id);
        mark_task_cancelled(&state, &events, task_id);
        return;
    }

    let payload = match UploadPayload::from_file(&file_path).await {
        Ok(payload) => payload,
        Err(e) => {
            log::error!(
                "Failed to read {} for task {}: {}",
                file_path.display(),
                task_id,
                e
            );
            mark_task_failed(&state, &events, task_id, &e);
            return;
        }
    };

    if payload.is_empty() {
        mark_task_failed(
            &state,
            &events,
            task_id,
            &ClientError::validation("file", "Selected file is empty"),
        );
        return;
    }

    log::info!(
        "📤 Uploading {} ({:.2} MB) as task {}",
        file_path.display(),
        payload.len() as f64 / 1024.0 / 1024.0,
        task_id
    );

    let outcome = client.upload_pdf(&payload, &cancel).await;

    // The user may have cancelled while the request was in flight; that
    // terminal state must survive whatever arrived afterwards.
    if is_task_cancelled(&state, task_id) {
        log::info!(
            "Task {} cancelled in flight - discarding the settled outcome",
            task_id
        );
        mark_task_cancelled(&state, &events, task_id);
        return;
    }

    match outcome {
        Ok(UploadOutcome::Report(report)) => {
            log::info!("✅ Task {} completed", task_id);
            mark_task_succeeded(&state, &events, task_id, report);
        }
        Ok(UploadOutcome::ServerError(message)) => {
            log::warn!("❌ Task {} rejected by the service: {}", task_id, message);
            mark_task_failed(
                &state,
                &events,
                task_id,
                &ClientError::server_reported(&message),
            );
        }
        Err(e) if e.is_cancellation() => {
            mark_task_cancelled(&state, &events, task_id);
        }
        Err(e) => {
            log::error!("❌ Task {} transport failure: {}", task_id, e);
            mark_task_failed(&state, &events, task_id, &e);
        }
    }
}
