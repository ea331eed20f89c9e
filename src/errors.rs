use crate::coordinator::task::UploadTask;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file type: {path}. Only PDF files are supported.")]
    InvalidFileType { path: String },

    #[error("File too large: {path}. Exceeds the upload size limit.")]
    FileTooLarge { path: String },

    #[error("Upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("Extractor reported error: {message}")]
    ServerReported { message: String },

    #[error("An upload is already in progress")]
    AlreadyInProgress,

    #[error("Upload cancelled during {phase}")]
    Cancelled { phase: String },

    #[error("Unknown extraction task: {task_id}")]
    UnknownTask { task_id: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Custom result type
pub type ClientResult<T> = Result<T, ClientError>;

/// Error helpers
impl ClientError {
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn file_not_found(path: &str) -> Self {
        Self::FileNotFound {
            path: path.to_string(),
        }
    }

    pub fn invalid_file_type(path: &str) -> Self {
        Self::InvalidFileType {
            path: path.to_string(),
        }
    }

    pub fn file_too_large(path: &str) -> Self {
        Self::FileTooLarge {
            path: path.to_string(),
        }
    }

    pub fn invalid_endpoint(url: &str) -> Self {
        Self::InvalidEndpoint {
            url: url.to_string(),
        }
    }

    pub fn upload_failed(reason: &str) -> Self {
        Self::UploadFailed {
            reason: reason.to_string(),
        }
    }

    pub fn server_reported(message: &str) -> Self {
        Self::ServerReported {
            message: message.to_string(),
        }
    }

    pub fn cancelled(phase: &str) -> Self {
        Self::Cancelled {
            phase: phase.to_string(),
        }
    }

    pub fn unknown_task(task_id: &str) -> Self {
        Self::UnknownTask {
            task_id: task_id.to_string(),
        }
    }

    /// Cancellation is a distinct terminal status, not a user-visible error.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ClientError::Cancelled { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::UploadFailed { .. } | ClientError::Io(_)
        )
    }
}

/// Task state type
pub type TaskState = Arc<Mutex<UploadTask>>;

/// Safe task state update, applied only while `task_id` is still the current task
pub fn safe_task_update<F>(state: &TaskState, task_id: Uuid, operation: &str, f: F) -> bool
where
    F: FnOnce(&mut UploadTask),
{
    match state.lock() {
        Ok(mut task) => {
            if task.id == Some(task_id) {
                f(&mut task);
                true
            } else {
                log::warn!(
                    "Task {} is no longer current for {} operation",
                    task_id,
                    operation
                );
                false
            }
        }
        Err(e) => {
            log::error!(
                "Failed to acquire task lock for {} on task {} (non-critical): {}",
                operation,
                task_id,
                e
            );
            false
        }
    }
}

pub fn safe_task_read<F, R>(state: &TaskState, task_id: Uuid, operation: &str, f: F) -> Option<R>
where
    F: FnOnce(&UploadTask) -> R,
{
    match state.lock() {
        Ok(task) => {
            if task.id == Some(task_id) {
                Some(f(&task))
            } else {
                log::warn!(
                    "Task {} is no longer current for {} operation",
                    task_id,
                    operation
                );
                None
            }
        }
        Err(e) => {
            log::error!(
                "Failed to acquire task lock for {} on task {} (non-critical): {}",
                operation,
                task_id,
                e
            );
            None
        }
    }
}
