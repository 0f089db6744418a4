//! Notification frame types and the job message classifier.
//!
//! The notification service sends JSON text frames shaped like
//! `{"jobId": "...", "messagetype": "status", "status": "..."}` or
//! `{"jobId": "...", "messagetype": "progress", "progress": 42}`. Frames
//! for other jobs share the same socket, so every frame is filtered by
//! job id before it is interpreted.
//!
//! Fields are read one at a time from the JSON object. A field whose type
//! is unexpected reads as absent, so it only matters when the frame's
//! `messagetype` needs it.

use serde::de::Error as _;
use serde_json::Value;

use conceptev_core::types::JobId;

/// `messagetype` value of status frames.
pub const MESSAGE_TYPE_STATUS: &str = "status";
/// `messagetype` value of progress frames.
pub const MESSAGE_TYPE_PROGRESS: &str = "progress";

/// One notification frame, as far as the monitor cares about it.
///
/// Every field is optional: the service adds message types over time and
/// a frame that lacks the fields for its type is simply irrelevant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationMessage {
    /// `jobId`
    pub job_id: Option<String>,
    pub messagetype: Option<String>,
    pub status: Option<String>,
    pub progress: Option<f64>,
}

impl NotificationMessage {
    /// Pick the known fields out of a JSON object.
    ///
    /// Returns `None` when `value` is not an object. A field holding the
    /// wrong JSON type is treated as missing.
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_owned);

        Some(Self {
            job_id: text("jobId"),
            messagetype: text("messagetype"),
            status: text("status"),
            progress: fields.get("progress").and_then(Value::as_f64),
        })
    }
}

/// What a single frame means for the job under observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Not for this job, not a known type, or missing its payload field.
    None,
    /// A status string; may or may not be terminal.
    Status(String),
    /// A progress value. Never terminal.
    Progress(f64),
}

/// Parse a notification text frame.
///
/// Returns `Err` for malformed JSON or a top-level value that is not an
/// object.
pub fn parse_message(text: &str) -> Result<NotificationMessage, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    NotificationMessage::from_value(&value)
        .ok_or_else(|| serde_json::Error::custom("notification frame is not a JSON object"))
}

/// Interpret an already parsed frame for `job_id`.
pub fn classify_message(message: &NotificationMessage, job_id: &JobId) -> Signal {
    if message.job_id.as_deref() != Some(job_id.as_str()) {
        return Signal::None;
    }

    match message.messagetype.as_deref() {
        Some(MESSAGE_TYPE_STATUS) => match &message.status {
            Some(status) => Signal::Status(status.clone()),
            None => Signal::None,
        },
        Some(MESSAGE_TYPE_PROGRESS) => match message.progress {
            Some(progress) => Signal::Progress(progress),
            None => Signal::None,
        },
        _ => Signal::None,
    }
}

/// Parse and interpret a raw text frame for `job_id`.
///
/// Malformed frames are logged and yield [`Signal::None`]; they never end
/// the wait.
pub fn classify(text: &str, job_id: &JobId) -> Signal {
    match parse_message(text) {
        Ok(message) => classify_message(&message, job_id),
        Err(e) => {
            tracing::warn!(
                job_id = %job_id,
                error = %e,
                raw_message = %text,
                "Skipping malformed notification frame",
            );
            Signal::None
        }
    }
}
