//! Terminal-state policy for job status strings.
//!
//! The notification service reports status as free-form strings. Only
//! three values end a wait: two mean success and one means failure.
//! Everything else (`"In Progress"`, `"Queued"`, ...) keeps the wait going.

/// Terminal-success marker sent by the simulation service.
pub const STATUS_COMPLETE: &str = "complete";
/// Terminal-success marker sent by the orchestration backend.
pub const STATUS_FINISHED: &str = "FINISHED";
/// Terminal-failure marker.
pub const STATUS_ERROR: &str = "FAILED";

/// The remote job reached its failure status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Job Failed with status {status}")]
pub struct JobFailed {
    pub status: String,
}

/// Typed view of a status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Complete,
    Finished,
    Failed,
    /// Any non-terminal status, kept verbatim.
    Other(String),
}

impl JobStatus {
    /// Classify a raw status string. Matching is exact and case-sensitive.
    pub fn parse(status: &str) -> Self {
        match status {
            STATUS_COMPLETE => JobStatus::Complete,
            STATUS_FINISHED => JobStatus::Finished,
            STATUS_ERROR => JobStatus::Failed,
            other => JobStatus::Other(other.to_string()),
        }
    }

    /// `true` for success and failure markers alike.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Other(_))
    }

    /// `true` only for `complete` and `FINISHED`.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Finished)
    }
}

/// Decide whether `status` ends the wait.
///
/// Returns `Ok(true)` for the success markers, `Ok(false)` for anything
/// non-terminal (including no status at all), and `Err(JobFailed)` for the
/// failure marker. Failure travels on the error channel, not the boolean;
/// callers wanting one result type should match on [`JobStatus`] instead.
pub fn check_status(status: Option<&str>) -> Result<bool, JobFailed> {
    let Some(status) = status else {
        return Ok(false);
    };

    match JobStatus::parse(status) {
        JobStatus::Complete | JobStatus::Finished => Ok(true),
        JobStatus::Failed => Err(JobFailed {
            status: status.to_string(),
        }),
        JobStatus::Other(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_markers_are_terminal() {
        assert_eq!(check_status(Some(STATUS_COMPLETE)), Ok(true));
        assert_eq!(check_status(Some(STATUS_FINISHED)), Ok(true));
    }

    #[test]
    fn failure_marker_is_an_error() {
        let err = check_status(Some(STATUS_ERROR)).unwrap_err();
        assert_eq!(err.status, "FAILED");
        assert!(err.to_string().starts_with("Job Failed"));
    }

    #[test]
    fn other_statuses_keep_waiting() {
        for status in ["In Progress", "Queued", "unknown_status", "", "COMPLETE", "finished", "failed"] {
            assert_eq!(check_status(Some(status)), Ok(false), "status {status:?}");
        }
    }

    #[test]
    fn missing_status_keeps_waiting() {
        assert_eq!(check_status(None), Ok(false));
    }

    #[test]
    fn typed_view_matches_checker() {
        assert!(JobStatus::parse("complete").is_success());
        assert!(JobStatus::parse("FINISHED").is_terminal());
        assert!(JobStatus::parse("FAILED").is_terminal());
        assert!(!JobStatus::parse("FAILED").is_success());
        assert_eq!(
            JobStatus::parse("In Progress"),
            JobStatus::Other("In Progress".into())
        );
        assert!(!JobStatus::parse("In Progress").is_terminal());
    }
}
