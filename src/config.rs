use serde::{Deserialize, Serialize};

use crate::errors::{ClientError, ClientResult};
use crate::security::InputValidator;

/// Where the extraction service listens by default.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";

/// The service rejects uploads above this size.
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Coordinator settings. In-memory only; hosts that persist settings embed
/// this struct in their own configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub max_file_size_bytes: u64,
    pub progress_poll_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 120,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            progress_poll_ms: 500,
        }
    }
}

impl CoordinatorConfig {
    /// Convenience constructor for the common case of a non-default endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }
}

pub fn validate_config(config: &CoordinatorConfig) -> ClientResult<()> {
    InputValidator::validate_endpoint_url(&config.endpoint)?;

    if config.request_timeout_secs == 0 {
        return Err(ClientError::validation("request_timeout_secs", "Must be greater than 0"));
    }

    if config.max_file_size_bytes == 0 {
        return Err(ClientError::validation("max_file_size_bytes", "Must be greater than 0"));
    }

    if config.progress_poll_ms < 100 {
        return Err(ClientError::validation("progress_poll_ms", "Must be at least 100ms"));
    }

    Ok(())
}
