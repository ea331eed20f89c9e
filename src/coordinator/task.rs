use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::extractor_client::ExtractionReport;

/// Lifecycle of a single upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Idle,
    InFlight,
    Succeeded,
    Failed,
    Cancelled,
}

impl UploadStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, UploadStatus::InFlight)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadStatus::Succeeded | UploadStatus::Failed | UploadStatus::Cancelled
        )
    }
}

/// The transient record tracking one upload attempt's state and outcome.
///
/// Exactly one of these exists per coordinator; it is replaced when the next
/// submission begins.
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub id: Option<Uuid>,
    pub file: Option<PathBuf>,
    pub status: UploadStatus,
    pub status_text: String,
    pub error_message: Option<String>,
    /// Task id assigned by the extraction service, known once it responds.
    pub remote_task_id: Option<String>,
    pub current_progress: f32,
    pub current_section: Option<String>,
    pub report: Option<ExtractionReport>,
    pub created_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl UploadTask {
    pub fn idle() -> Self {
        Self {
            id: None,
            file: None,
            status: UploadStatus::Idle,
            status_text: String::new(),
            error_message: None,
            remote_task_id: None,
            current_progress: 0.0,
            current_section: None,
            report: None,
            created_at: None,
            settled_at: None,
        }
    }

    /// Fresh InFlight task for a newly accepted submission.
    pub fn begin(id: Uuid, file: PathBuf) -> Self {
        Self {
            id: Some(id),
            file: Some(file),
            status: UploadStatus::InFlight,
            status_text: "Uploading...".to_string(),
            error_message: None,
            remote_task_id: None,
            current_progress: 0.0,
            current_section: None,
            report: None,
            created_at: Some(Utc::now()),
            settled_at: None,
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            task_id: self.id,
            status: self.status,
            status_text: self.status_text.clone(),
            error_message: self.error_message.clone(),
            remote_task_id: self.remote_task_id.clone(),
            current_progress: self.current_progress,
            current_section: self.current_section.clone(),
            report: self.report.clone(),
        }
    }
}

impl Default for UploadTask {
    fn default() -> Self {
        Self::idle()
    }
}

/// State-change notification published to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub task_id: Option<Uuid>,
    pub status: UploadStatus,
    pub status_text: String,
    pub error_message: Option<String>,
    pub remote_task_id: Option<String>,
    pub current_progress: f32,
    pub current_section: Option<String>,
    /// Present once the task has Succeeded.
    pub report: Option<ExtractionReport>,
}
