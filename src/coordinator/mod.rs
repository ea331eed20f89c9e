// Upload coordination module
//
// This module is responsible for mediating exactly one upload to the
// extraction service at a time and reporting its outcome

pub mod extractor_client;
pub mod progress_tracker;
pub mod submission;
pub mod task;

pub use extractor_client::{
    CancelAck, ExtractionReport, ExtractorClient, ProgressReport, UploadOutcome, UploadPayload,
};
pub use task::{StatusSnapshot, UploadStatus, UploadTask};

use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{validate_config, CoordinatorConfig};
use crate::errors::{ClientError, ClientResult, TaskState};
use crate::security::InputValidator;

use progress_tracker::{publish_snapshot, record_remote_progress, STATUS_TEXT_CANCELLED};

/// Mediates one upload operation at a time.
///
/// Holds the single [`UploadTask`], guards against concurrent submissions,
/// and publishes [`StatusSnapshot`]s on every transition. Instances are
/// independent; tests run several side by side.
pub struct UploadCoordinator {
    config: CoordinatorConfig,
    client: ExtractorClient,
    state: TaskState,
    events: watch::Sender<StatusSnapshot>,
    cancel_token: Mutex<Option<CancellationToken>>,
}

impl UploadCoordinator {
    pub fn new(config: CoordinatorConfig) -> ClientResult<Self> {
        validate_config(&config)?;
        let client = ExtractorClient::new(&config)?;

        let task = UploadTask::idle();
        let (events, _) = watch::channel(task.snapshot());

        Ok(Self {
            config,
            client,
            state: Arc::new(Mutex::new(task)),
            events,
            cancel_token: Mutex::new(None),
        })
    }

    /// Accept a PDF for upload and dispatch it.
    ///
    /// Control returns as soon as the submission driver is spawned; the
    /// outcome arrives through the status channel. Fails with
    /// `AlreadyInProgress` while a previous task is still InFlight. Must be
    /// called from within a tokio runtime.
    pub fn submit(&self, file_path: impl AsRef<Path>) -> ClientResult<Uuid> {
        let file_path = file_path.as_ref();
        InputValidator::validate_pdf_file(file_path, self.config.max_file_size_bytes)?;

        let task_id = Uuid::new_v4();

        {
            let mut task = self
                .state
                .lock()
                .map_err(|e| ClientError::Internal(format!("task state lock poisoned: {}", e)))?;

            if task.status.is_in_flight() {
                log::warn!(
                    "Rejecting submission of {} - task {:?} is still in flight",
                    file_path.display(),
                    task.id
                );
                return Err(ClientError::AlreadyInProgress);
            }

            // The previous task, terminal or idle, is replaced here
            *task = UploadTask::begin(task_id, file_path.to_path_buf());
        }

        publish_snapshot(&self.state, &self.events);

        let cancel = CancellationToken::new();
        match self.cancel_token.lock() {
            Ok(mut slot) => *slot = Some(cancel.clone()),
            Err(e) => {
                log::error!("Failed to store cancellation token (non-critical): {}", e);
            }
        }

        log::info!(
            "Accepted submission of {} as task {}",
            file_path.display(),
            task_id
        );

        tokio::spawn(submission::run_submission(
            self.client.clone(),
            file_path.to_path_buf(),
            Arc::clone(&self.state),
            self.events.clone(),
            task_id,
            cancel,
        ));

        Ok(task_id)
    }

    /// Request cancellation of the InFlight task.
    ///
    /// No-op unless a task is InFlight; repeated calls after settlement do
    /// nothing. Returns whether a cancellation was actually initiated. If the
    /// service already assigned a task id, a best-effort remote cancel is
    /// issued as well.
    pub fn cancel(&self) -> bool {
        let remote_task_id = {
            let mut task = match self.state.lock() {
                Ok(task) => task,
                Err(e) => {
                    log::error!("Failed to acquire task lock for cancel: {}", e);
                    return false;
                }
            };

            if !task.status.is_in_flight() {
                log::debug!("Cancel ignored - no upload in flight ({:?})", task.status);
                return false;
            }

            task.status = UploadStatus::Cancelled;
            task.status_text = STATUS_TEXT_CANCELLED.to_string();
            task.settled_at = Some(chrono::Utc::now());

            log::info!("Cancellation requested for task {:?}", task.id);
            task.remote_task_id.clone()
        };

        publish_snapshot(&self.state, &self.events);

        if let Ok(mut slot) = self.cancel_token.lock() {
            if let Some(token) = slot.take() {
                token.cancel();
            }
        }

        if let Some(remote_id) = remote_task_id {
            self.spawn_remote_cancel(remote_id);
        }

        true
    }

    /// Current state of the coordinator's task.
    pub fn status(&self) -> StatusSnapshot {
        self.events.borrow().clone()
    }

    /// Subscribe to state-change notifications.
    ///
    /// Watch semantics: observers may miss intermediate snapshots but always
    /// see the latest, including the terminal one.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.events.subscribe()
    }

    /// Wait for the current task to leave InFlight and return its snapshot.
    pub async fn wait_until_settled(&self) -> StatusSnapshot {
        let mut rx = self.events.subscribe();
        loop {
            let snapshot = rx.borrow().clone();
            if !snapshot.status.is_in_flight() {
                return snapshot;
            }
            if rx.changed().await.is_err() {
                // Sender gone; the last observed snapshot is all there is
                return snapshot;
            }
        }
    }

    /// Fetch server-side progress for a known extraction task, reflecting it
    /// into the local task state when one is current.
    pub async fn remote_progress(&self, remote_task_id: &str) -> ClientResult<ProgressReport> {
        let report = self.client.fetch_progress(remote_task_id).await?;
        if let Some(local_id) = self.current_task_id() {
            record_remote_progress(&self.state, &self.events, local_id, &report);
        }
        Ok(report)
    }

    /// Poll the progress endpoint until the service reports a terminal status.
    pub async fn poll_remote_progress(&self, remote_task_id: &str) -> ClientResult<ProgressReport> {
        let interval = Duration::from_millis(self.config.progress_poll_ms);
        loop {
            let report = self.remote_progress(remote_task_id).await?;
            if !report.is_processing() {
                return Ok(report);
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Ask the service to stop processing a known extraction task.
    pub async fn remote_cancel(&self, remote_task_id: &str) -> ClientResult<CancelAck> {
        self.client.request_cancel(remote_task_id).await
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    fn current_task_id(&self) -> Option<Uuid> {
        self.state.lock().ok().and_then(|task| task.id)
    }

    fn spawn_remote_cancel(&self, remote_id: String) {
        let client = self.client.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = client.request_cancel(&remote_id).await {
                        log::warn!(
                            "Remote cancel for task {} failed (non-critical): {}",
                            remote_id,
                            e
                        );
                    }
                });
            }
            Err(_) => {
                log::debug!("Skipping remote cancel for {} - no runtime available", remote_id);
            }
        }
    }
}
