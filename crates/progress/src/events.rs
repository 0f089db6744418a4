//! Observer hooks for status and progress frames.
//!
//! The monitor reports every status and progress signal for its job to a
//! [`ProgressObserver`]. Observers are a side channel only: nothing they
//! do changes how the wait ends.

use chrono::Utc;
use conceptev_core::types::{JobId, Timestamp};
use serde::Serialize;
use tokio::sync::mpsc;

/// Receives job signals as the monitor sees them, in delivery order.
pub trait ProgressObserver: Send + Sync {
    fn on_status(&self, _job_id: &JobId, _status: &str) {}

    fn on_progress(&self, _job_id: &JobId, _progress: f64) {}
}

/// Default observer: one log line per signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_status(&self, job_id: &JobId, status: &str) {
        tracing::info!(job_id = %job_id, status = %status, "Status:{status}");
    }

    fn on_progress(&self, job_id: &JobId, progress: f64) {
        tracing::info!(job_id = %job_id, progress, "Progress:{progress}");
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// A job signal, as forwarded by [`ChannelObserver`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    Status {
        job_id: JobId,
        status: String,
        at: Timestamp,
    },
    Progress {
        job_id: JobId,
        progress: f64,
        at: Timestamp,
    },
}

impl JobEvent {
    /// The job this event belongs to.
    pub fn job_id(&self) -> &JobId {
        match self {
            JobEvent::Status { job_id, .. } | JobEvent::Progress { job_id, .. } => job_id,
        }
    }
}

/// Forwards signals into an unbounded channel, e.g. for a progress bar.
///
/// A dropped receiver is not an error; events are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<JobEvent>,
}

impl ChannelObserver {
    /// An observer and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_status(&self, job_id: &JobId, status: &str) {
        let _ = self.tx.send(JobEvent::Status {
            job_id: job_id.clone(),
            status: status.to_string(),
            at: Utc::now(),
        });
    }

    fn on_progress(&self, job_id: &JobId, progress: f64) {
        let _ = self.tx.send(JobEvent::Progress {
            job_id: job_id.clone(),
            progress,
            at: Utc::now(),
        });
    }
}
