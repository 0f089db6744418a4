//! Wait for a job to reach a terminal state.
//!
//! [`JobMonitor`] opens one notification channel per wait, feeds every
//! frame through the classifier and the terminal-state check, and returns
//! the terminal status string. The wait runs as a single cooperative
//! routine that only suspends while receiving the next frame; an overall
//! deadline and an optional [`CancellationToken`] are raced against it.
//!
//! Two entry points share that routine:
//!
//! * [`JobMonitor::wait_for_completion`] for callers already on a tokio
//!   runtime.
//! * [`JobMonitor::wait_for_completion_blocking`] for plain blocking
//!   code; it runs the routine on a dedicated current-thread runtime that
//!   is torn down before returning.
//!
//! The channel is closed exactly once on every exit path, including when
//! the calling task is dropped mid-wait.

use std::sync::Arc;
use std::time::Duration;

use conceptev_core::settings::{MonitorSettings, DEFAULT_JOB_TIMEOUT_SECS};
use conceptev_core::types::JobId;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::client::{Connector, NotificationChannel, OcmConnector};
use crate::credentials::Credentials;
use crate::error::MonitorError;
use crate::events::{ProgressObserver, TracingObserver};
use crate::messages::{classify, Signal};
use crate::status::check_status;

/// Default overall deadline for one wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS);

/// Deadline used when `now + timeout` does not fit in an [`Instant`].
/// Roughly thirty years, the same horizon tokio uses for "never".
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Waits on jobs through a [`Connector`].
///
/// Cheap to share behind an `Arc`; concurrent waits each open their own
/// channel and share nothing mutable.
pub struct JobMonitor<C = OcmConnector> {
    connector: C,
    timeout: Duration,
    observer: Arc<dyn ProgressObserver>,
    cancel: Option<CancellationToken>,
}

impl JobMonitor<OcmConnector> {
    /// Build a monitor for the production connector from settings.
    ///
    /// Fails if the TLS trust configuration cannot be built.
    pub fn from_settings(settings: &MonitorSettings) -> Result<Self, MonitorError> {
        let connector = OcmConnector::from_settings(settings)?;
        Ok(Self::new(connector).with_timeout(settings.job_timeout))
    }
}

impl<C: Connector> JobMonitor<C> {
    /// Wrap `connector` with the default one-hour deadline, the
    /// [`TracingObserver`] and no cancellation token.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            timeout: DEFAULT_TIMEOUT,
            observer: Arc::new(TracingObserver),
            cancel: None,
        }
    }

    /// Override the overall deadline (connect + receive).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the default [`TracingObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Abort waits when `cancel` fires. Waits then end with
    /// [`MonitorError::Cancelled`].
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Overall deadline applied to each wait.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The connector used to open channels.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Wait on the caller's runtime until `job_id` reaches a terminal
    /// status.
    ///
    /// Returns the terminal success status (`"complete"` or
    /// `"FINISHED"`). Fails with [`MonitorError::JobFailed`],
    /// [`MonitorError::Timeout`], [`MonitorError::ChannelUnavailable`] or
    /// [`MonitorError::Cancelled`].
    pub async fn wait_for_completion(
        &self,
        job_id: &JobId,
        user_id: &str,
        credentials: &Credentials,
    ) -> Result<String, MonitorError> {
        let started = Instant::now();
        let deadline = deadline_after(started, self.timeout);
        let timed_out = || MonitorError::Timeout {
            job_id: job_id.clone(),
            waited: started.elapsed(),
        };

        let open = async {
            let token = credentials.resolve().await?;
            self.connector.connect(user_id, &token).await
        };

        let channel = tokio::select! {
            biased;
            _ = cancelled(self.cancel.as_ref()) => {
                return Err(MonitorError::Cancelled { job_id: job_id.clone() });
            }
            opened = tokio::time::timeout_at(deadline, open) => match opened {
                Ok(result) => result?,
                Err(_) => return Err(timed_out()),
            },
        };

        tracing::debug!(job_id = %job_id, "Watching notification channel");

        let mut session = MonitorSession::new(channel);

        // Cancellation first, then frames, then the deadline.
        let outcome = tokio::select! {
            biased;
            _ = cancelled(self.cancel.as_ref()) => {
                Err(MonitorError::Cancelled { job_id: job_id.clone() })
            }
            result = watch(&mut session, job_id, self.observer.as_ref()) => result,
            _ = tokio::time::sleep_until(deadline) => Err(timed_out()),
        };

        let frames = session.frames;
        session.close().await;

        match &outcome {
            Ok(status) => {
                tracing::info!(job_id = %job_id, status = %status, frames, "Job reached terminal status");
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, frames, "Job wait ended without success");
            }
        }

        outcome
    }

    /// Blocking counterpart of [`wait_for_completion`](Self::wait_for_completion).
    ///
    /// Creates a current-thread runtime, runs the wait to completion and
    /// shuts the runtime down before returning. Must not be called from
    /// inside a tokio runtime; doing so returns [`MonitorError::Runtime`].
    pub fn wait_for_completion_blocking(
        &self,
        job_id: &JobId,
        user_id: &str,
        credentials: &Credentials,
    ) -> Result<String, MonitorError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(MonitorError::Runtime(
                "blocking wait called from inside an async runtime; use wait_for_completion"
                    .into(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| MonitorError::Runtime(format!("Failed to create async runtime: {e}")))?;

        let result = runtime.block_on(self.wait_for_completion(job_id, user_id, credentials));
        drop(runtime);
        result
    }
}

/// Owns the channel for one wait and guarantees it is closed once.
struct MonitorSession<Ch: NotificationChannel> {
    channel: Ch,
    closed: bool,
    frames: usize,
}

impl<Ch: NotificationChannel> MonitorSession<Ch> {
    fn new(channel: Ch) -> Self {
        Self {
            channel,
            closed: false,
            frames: 0,
        }
    }

    async fn close(mut self) {
        self.closed = true;
        self.channel.close().await;
    }
}

impl<Ch: NotificationChannel> Drop for MonitorSession<Ch> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::debug!("Wait dropped mid-flight, releasing notification channel");
            self.closed = true;
            self.channel.close_now();
        }
    }
}

/// Receive frames until a terminal status for `job_id` arrives.
async fn watch<Ch: NotificationChannel>(
    session: &mut MonitorSession<Ch>,
    job_id: &JobId,
    observer: &dyn ProgressObserver,
) -> Result<String, MonitorError> {
    loop {
        let text = match session.channel.next_frame().await {
            Some(Ok(text)) => text,
            Some(Err(e)) => return Err(e),
            None => {
                return Err(MonitorError::ChannelUnavailable(format!(
                    "notification channel closed before job {job_id} reached a terminal state"
                )));
            }
        };
        session.frames += 1;

        match classify(&text, job_id) {
            Signal::Status(status) => {
                observer.on_status(job_id, &status);
                match check_status(Some(&status)) {
                    Ok(true) => return Ok(status),
                    Ok(false) => {}
                    Err(failed) => {
                        let payload = serde_json::from_str(&text)
                            .unwrap_or(serde_json::Value::String(text));
                        return Err(MonitorError::JobFailed {
                            job_id: job_id.clone(),
                            status: failed.status,
                            payload,
                        });
                    }
                }
            }
            Signal::Progress(progress) => observer.on_progress(job_id, progress),
            Signal::None => {}
        }
    }
}

/// Resolves when `cancel` fires; never resolves without a token.
fn deadline_after(start: Instant, timeout: Duration) -> Instant {
    start
        .checked_add(timeout)
        .unwrap_or_else(|| start + FAR_FUTURE)
}

async fn cancelled(cancel: Option<&CancellationToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}
