use reqwest::{multipart, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::CoordinatorConfig;
use crate::errors::{ClientError, ClientResult};
use crate::security::InputValidator;

/// Multipart field name the extraction service expects the PDF under.
const PDF_FIELD_NAME: &str = "pdf_file";

/// Typed client for the extraction service endpoints.
#[derive(Debug, Clone)]
pub struct ExtractorClient {
    client: Client,
    endpoint: String,
}

impl ExtractorClient {
    pub fn new(config: &CoordinatorConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Dispatch the upload request, racing it against the cancellation signal.
    ///
    /// Dropping the in-flight request future aborts the underlying transfer,
    /// so cancellation here is cooperative abort rather than fire-and-forget.
    pub async fn upload_pdf(
        &self,
        payload: &UploadPayload,
        cancel: &CancellationToken,
    ) -> ClientResult<UploadOutcome> {
        let form = payload.build_form()?;
        let url = format!("{}/upload", self.endpoint);

        log::debug!("POST {} ({} bytes)", url, payload.len());

        let request = self.client.post(&url).multipart(form).send();

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                log::info!("Upload request aborted before a response arrived");
                return Err(ClientError::cancelled("upload request"));
            }
            result = request => result?,
        };

        let status = response.status();
        let body = response.text().await?;

        classify_upload_response(status, &body)
    }

    /// Fetch server-side progress for a known extraction task.
    pub async fn fetch_progress(&self, task_id: &str) -> ClientResult<ProgressReport> {
        let url = format!("{}/progress/{}", self.endpoint, task_id);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::unknown_task(task_id));
        }

        let report = response.error_for_status()?.json::<ProgressReport>().await?;
        Ok(report)
    }

    /// Ask the service to stop processing a known extraction task.
    pub async fn request_cancel(&self, task_id: &str) -> ClientResult<CancelAck> {
        let url = format!("{}/cancel/{}", self.endpoint, task_id);
        let response = self.client.post(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::unknown_task(task_id));
        }

        let ack = response.error_for_status()?.json::<CancelAck>().await?;
        log::info!(
            "Service acknowledged cancellation for task {}: {}",
            ack.task_id,
            ack.status
        );
        Ok(ack)
    }
}

/// Classified terminal outcome of an upload request.
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// Well-formed JSON without an error field.
    Report(ExtractionReport),
    /// Well-formed JSON carrying an error field; message surfaced verbatim.
    ServerError(String),
}

/// The service signals failure through an `error` field rather than the HTTP
/// status alone, so the body is parsed before the status is consulted.
fn classify_upload_response(status: StatusCode, body: &str) -> ClientResult<UploadOutcome> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => {
            if let Some(value) = json.get("error") {
                let message = value
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string());
                return Ok(UploadOutcome::ServerError(message));
            }

            if !status.is_success() {
                return Err(ClientError::UploadFailed {
                    reason: format!("extractor API error {} with no error detail", status),
                });
            }

            let report: ExtractionReport = serde_json::from_value(json)?;
            Ok(UploadOutcome::Report(report))
        }
        Err(e) => {
            log::warn!(
                "Non-JSON response from extractor (status {}): {}",
                status,
                e
            );
            Err(ClientError::UploadFailed {
                reason: format!(
                    "extractor returned a non-JSON response (status {})",
                    status
                ),
            })
        }
    }
}

/// Success payload of `/upload`: matched numbers per journal section, in
/// document order, plus the server-assigned task id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionReport {
    #[serde(default)]
    pub advertisement: Vec<String>,
    #[serde(default)]
    pub corrigenda: Vec<String>,
    #[serde(default)]
    pub rc: Vec<String>,
    #[serde(default)]
    pub renewal: Vec<String>,
    #[serde(default)]
    pub pr_section: Vec<String>,
    pub task_id: Option<String>,
}

impl ExtractionReport {
    pub fn total_numbers(&self) -> usize {
        self.advertisement.len()
            + self.corrigenda.len()
            + self.rc.len()
            + self.renewal.len()
            + self.pr_section.len()
    }
}

/// Payload of `/progress/<task_id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub progress: f32,
    #[serde(default)]
    pub current_section: String,
    pub status: String,
    pub task_id: String,
}

impl ProgressReport {
    pub fn is_processing(&self) -> bool {
        self.status == "processing"
    }
}

/// Payload of `/cancel/<task_id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAck {
    pub status: String,
    pub task_id: String,
}

/// Helper struct to hold upload payload data
#[derive(Debug, Clone)]
pub struct UploadPayload {
    filename: String,
    data: Vec<u8>,
    mime_type: String,
}

impl UploadPayload {
    pub async fn from_file(file_path: &Path) -> ClientResult<Self> {
        let data = tokio::fs::read(file_path).await?;
        let filename = file_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        Ok(Self {
            filename: InputValidator::sanitize_filename(&filename),
            data,
            mime_type: "application/pdf".to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn build_form(&self) -> ClientResult<multipart::Form> {
        let part = multipart::Part::bytes(self.data.clone())
            .file_name(self.filename.clone())
            .mime_str(&self.mime_type)?;

        Ok(multipart::Form::new().part(PDF_FIELD_NAME, part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins_over_http_status() {
        let outcome =
            classify_upload_response(StatusCode::OK, r#"{"error": "Only PDF files are allowed"}"#)
                .unwrap();
        match outcome {
            UploadOutcome::ServerError(message) => {
                assert_eq!(message, "Only PDF files are allowed")
            }
            other => panic!("expected server error, got {:?}", other),
        }

        // 400 with an error body still classifies as server-reported
        let outcome =
            classify_upload_response(StatusCode::BAD_REQUEST, r#"{"error": "No file uploaded"}"#)
                .unwrap();
        assert!(matches!(outcome, UploadOutcome::ServerError(_)));
    }

    #[test]
    fn success_body_parses_into_report() {
        let body = r#"{
            "advertisement": ["12345", "67890"],
            "corrigenda": ["11111"],
            "rc": [],
            "renewal": ["22222", "33333"],
            "pr_section": [],
            "task_id": "abc-123"
        }"#;

        let outcome = classify_upload_response(StatusCode::OK, body).unwrap();
        match outcome {
            UploadOutcome::Report(report) => {
                assert_eq!(report.advertisement, vec!["12345", "67890"]);
                assert_eq!(report.total_numbers(), 5);
                assert_eq!(report.task_id.as_deref(), Some("abc-123"));
            }
            other => panic!("expected report, got {:?}", other),
        }
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let outcome = classify_upload_response(StatusCode::OK, r#"{"task_id": "t1"}"#).unwrap();
        match outcome {
            UploadOutcome::Report(report) => assert_eq!(report.total_numbers(), 0),
            other => panic!("expected report, got {:?}", other),
        }
    }

    #[test]
    fn non_json_body_is_a_transport_failure() {
        let result = classify_upload_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        match result {
            Err(e) => assert!(e.is_transport()),
            Ok(other) => panic!("expected transport failure, got {:?}", other),
        }
    }
}
