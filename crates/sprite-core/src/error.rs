//! Error types for sprite generation

use thiserror::Error;

/// The main error type for sprite operations
#[derive(Debug, Error)]
pub enum SpriteError {
    /// Missing or invalid credentials / settings. Detected before any network call.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The remote service rejected the job at creation. Carries the raw response body.
    #[error("Submission rejected: {0}")]
    SubmissionError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Download failed ({url}): {cause}")]
    DownloadError { url: String, cause: String },

    /// The remote service accepted the job and later reported it as failed.
    #[error("Remote failure: {0}")]
    RemoteFailure(String),

    #[error("Timed out: {0}")]
    TimedOut(String),

    #[error("Batch plan error: {0}")]
    PlanError(String),

    #[error("Post-processing error: {0}")]
    PostProcessError(String),

    #[error("Interrupted")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),}

impl SpriteError {
    /// Whether a fresh attempt of the same work could succeed.
    ///
    /// Configuration and plan errors are fatal for the whole invocation, and a
    /// cancellation must never be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SpriteError::SubmissionError(_)
            | SpriteError::NetworkError(_)
            | SpriteError::DownloadError { .. }
            | SpriteError::RemoteFailure(_)
            | SpriteError::TimedOut(_)
            | SpriteError::PostProcessError(_)
            | SpriteError::IoError(_) => true,
            SpriteError::ConfigurationError(_)
            | SpriteError::PlanError(_)
            | SpriteError::Cancelled => false,
        }
    }
}

/// Result type alias for sprite operations
pub type Result<T> = std::result::Result<T, SpriteError>;
