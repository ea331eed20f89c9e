//! Client-side upload coordinator for the Trade Marks Journal PDF
//! number-extraction service.
//!
//! One [`UploadCoordinator`] owns one upload at a time: submit a PDF, watch
//! status snapshots, cancel cooperatively. The presentation layer renders;
//! this crate only coordinates.

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod security;

pub use config::CoordinatorConfig;
pub use coordinator::{
    ExtractionReport, ProgressReport, StatusSnapshot, UploadCoordinator, UploadStatus,
};
pub use errors::{ClientError, ClientResult};
