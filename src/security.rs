use crate::errors::{ClientError, ClientResult};
use regex::Regex;
use std::path::Path;

pub struct InputValidator;

impl InputValidator {
    pub fn validate_endpoint_url(url: &str) -> ClientResult<()> {
        let trimmed = url.trim();

        if trimmed.is_empty() {
            return Err(ClientError::validation("endpoint", "Endpoint URL cannot be empty"));
        }

        // Scheme, host, optional port, optional path - query strings and
        // credentials in the endpoint are rejected
        let endpoint_pattern =
            Regex::new(r"^https?://[a-zA-Z0-9\.\-]+(:\d{1,5})?(/[a-zA-Z0-9\-_\./]*)?$").unwrap();

        if !endpoint_pattern.is_match(trimmed) {
            return Err(ClientError::invalid_endpoint(trimmed));
        }

        if trimmed.len() > 500 {
            return Err(ClientError::validation("endpoint", "Endpoint URL too long"));
        }

        Ok(())
    }

    pub fn validate_file_path(path: &Path) -> ClientResult<()> {
        if path.as_os_str().is_empty() {
            return Err(ClientError::validation("file_path", "File path cannot be empty"));
        }

        let path_str = path.to_string_lossy();

        // Check for path traversal attempts
        if path_str.contains("..") || path_str.contains('~') {
            return Err(ClientError::validation("file_path", "Invalid file path detected"));
        }

        // The service only accepts PDFs; reject everything else up front
        match path.extension() {
            Some(extension) => {
                if extension.to_string_lossy().to_lowercase() != "pdf" {
                    return Err(ClientError::invalid_file_type(&path_str));
                }
            }
            None => {
                return Err(ClientError::validation("file_path", "File must have an extension"));
            }
        }

        if !path.exists() {
            return Err(ClientError::file_not_found(&path_str));
        }

        if !path.is_file() {
            return Err(ClientError::validation("file_path", "Path is not a file"));
        }

        Ok(())
    }

    pub fn validate_pdf_file(path: &Path, max_size_bytes: u64) -> ClientResult<()> {
        Self::validate_file_path(path)?;

        let metadata = std::fs::metadata(path)?;

        if metadata.len() == 0 {
            return Err(ClientError::validation("file_path", "Selected file is empty"));
        }

        if metadata.len() > max_size_bytes {
            return Err(ClientError::file_too_large(&path.to_string_lossy()));
        }

        Ok(())
    }

    pub fn sanitize_filename(filename: &str) -> String {
        // Remove or replace unsafe characters in filenames
        let unsafe_chars = Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).unwrap();
        let sanitized = unsafe_chars.replace_all(filename.trim(), "_");

        // Limit length
        if sanitized.len() > 255 {
            format!("{}...", &sanitized[..252])
        } else {
            sanitized.to_string()
        }
    }
}
