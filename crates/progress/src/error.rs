use std::time::Duration;

use conceptev_core::error::CoreError;
use conceptev_core::types::JobId;

/// Everything a job wait can end with besides a terminal success status.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Could not open, authenticate, or keep the notification channel.
    #[error("Notification channel unavailable: {0}")]
    ChannelUnavailable(String),

    /// The remote job reported its failure status.
    #[error("Job {job_id} failed with status {status}")]
    JobFailed {
        job_id: JobId,
        status: String,
        /// The frame that carried the failure, for diagnostics.
        payload: serde_json::Value,
    },

    /// No terminal status arrived before the deadline.
    #[error("Timed out after {waited:?} waiting for job {job_id}")]
    Timeout { job_id: JobId, waited: Duration },

    /// The caller's cancellation token fired during the wait.
    #[error("Wait for job {job_id} was cancelled")]
    Cancelled { job_id: JobId },

    /// The TLS trust configuration could not be built.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// The blocking entry point could not set up its own runtime.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Validation failures on connection parameters (empty user id or token)
/// are transport-level rejections from the caller's point of view.
impl From<CoreError> for MonitorError {
    fn from(e: CoreError) -> Self {
        MonitorError::ChannelUnavailable(e.to_string())
    }
}
