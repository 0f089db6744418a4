//! Process exit codes for `conceptev-monitor`.

use conceptev_progress::MonitorError;

/// The job reached a terminal success status.
pub const EXIT_OK: i32 = 0;
/// Missing or invalid configuration.
pub const EXIT_CONFIG: i32 = 1;
/// The job reported its failure status.
pub const EXIT_JOB_FAILED: i32 = 2;
/// No terminal status before the deadline.
pub const EXIT_TIMEOUT: i32 = 3;
/// The notification channel could not be opened or was lost.
pub const EXIT_CHANNEL: i32 = 4;

/// Map a failed wait to the exit code scripts can branch on.
pub fn exit_code(error: &MonitorError) -> i32 {
    match error {
        MonitorError::JobFailed { .. } => EXIT_JOB_FAILED,
        MonitorError::Timeout { .. } | MonitorError::Cancelled { .. } => EXIT_TIMEOUT,
        MonitorError::ChannelUnavailable(_) => EXIT_CHANNEL,
        MonitorError::Tls(_) | MonitorError::Runtime(_) => EXIT_CONFIG,
    }
}
