//! Job progress monitor for the ConceptEV notification service.
//!
//! Opens a WebSocket to the notification service, filters frames by job
//! id, and waits until the job reports a terminal status. See
//! [`monitor::JobMonitor`] for the entry points.

pub mod client;
pub mod credentials;
pub mod error;
pub mod events;
pub mod messages;
pub mod monitor;
pub mod status;
pub mod tls;

pub use client::{Connector, NotificationChannel, OcmConnector};
pub use credentials::{Credentials, TokenProvider};
pub use error::MonitorError;
pub use monitor::JobMonitor;
