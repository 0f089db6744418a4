//! WebSocket client for the job notification service.
//!
//! [`OcmConnector`] holds the endpoint and TLS configuration. Call
//! [`Connector::connect`] to open a live [`WsChannel`] for one user.
//! The [`Connector`] and [`NotificationChannel`] traits are the seams the
//! monitor is written against, so tests can script the frame sequence.

use std::sync::Arc;

use async_trait::async_trait;
use conceptev_core::error::CoreError;
use conceptev_core::settings::MonitorSettings;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, MaybeTlsStream, WebSocketStream};

use crate::error::MonitorError;
use crate::tls::{build_client_config, TrustConfig};

/// Opens notification channels.
#[async_trait]
pub trait Connector: Send + Sync {
    type Channel: NotificationChannel + 'static;

    /// Open one authenticated channel. No retry is attempted here.
    async fn connect(&self, user_id: &str, token: &str) -> Result<Self::Channel, MonitorError>;
}

/// An open, exclusively owned stream of notification text frames.
#[async_trait]
pub trait NotificationChannel: Send {
    /// Wait for the next text frame.
    ///
    /// `None` means the remote side closed the stream. Control frames are
    /// consumed internally and never returned.
    async fn next_frame(&mut self) -> Option<Result<String, MonitorError>>;

    /// Close the channel gracefully. Called at most once per session.
    async fn close(&mut self);

    /// Release the channel without awaiting anything. Used when the wait
    /// is dropped mid-flight and an async close is no longer possible.
    fn close_now(&mut self);
}

/// Connection configuration for the notification service.
#[derive(Clone)]
pub struct OcmConnector {
    socket_url: String,
    tls: Arc<rustls::ClientConfig>,
}

impl OcmConnector {
    /// Create a connector, building the TLS configuration up front.
    ///
    /// * `socket_url` - WebSocket endpoint, e.g. `wss://host/socket/user`.
    /// * `trust`      - root certificates to trust.
    pub fn new(socket_url: impl Into<String>, trust: &TrustConfig) -> Result<Self, MonitorError> {
        Ok(Self {
            socket_url: socket_url.into(),
            tls: build_client_config(trust)?,
        })
    }

    /// Create a connector for `settings.socket_url`, trusting the bundle in
    /// `settings.ca_bundle` when one is set.
    pub fn from_settings(settings: &MonitorSettings) -> Result<Self, MonitorError> {
        Self::new(
            settings.socket_url.clone(),
            &TrustConfig::from_settings(settings),
        )
    }

    /// The endpoint without the per-user query string.
    pub fn socket_url(&self) -> &str {
        &self.socket_url
    }

    /// The connection URI for `user_id`, carrying the bearer token in the
    /// query string as the service expects. Both values are
    /// form-urlencoded.
    pub fn socket_uri(&self, user_id: &str, token: &str) -> String {
        format!(
            "{}?userId={}&Authorization={}",
            self.socket_url,
            query_value(user_id),
            query_value(token)
        )
    }
}

impl std::fmt::Debug for OcmConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcmConnector")
            .field("socket_url", &self.socket_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for OcmConnector {
    type Channel = WsChannel;

    async fn connect(&self, user_id: &str, token: &str) -> Result<WsChannel, MonitorError> {
        require("user id", user_id)?;
        require("token", token)?;

        let uri = self.socket_uri(user_id, token);
        let connector = tokio_tungstenite::Connector::Rustls(Arc::clone(&self.tls));

        let (ws_stream, _response) =
            connect_async_tls_with_config(uri, None, false, Some(connector))
                .await
                .map_err(|e| {
                    MonitorError::ChannelUnavailable(format!(
                        "Failed to connect to {}: {e}",
                        self.socket_url
                    ))
                })?;

        tracing::info!(
            user_id = %user_id,
            "Connected to notification service at {}",
            self.socket_url,
        );

        Ok(WsChannel {
            stream: Some(ws_stream),
        })
    }
}

fn query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn require(name: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{name} must not be empty")));
    }
    Ok(())
}

/// A live WebSocket connection to the notification service.
pub struct WsChannel {
    /// `None` once the channel has been closed.
    stream: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

impl std::fmt::Debug for WsChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsChannel")
            .field("open", &self.stream.is_some())
            .finish()
    }
}

#[async_trait]
impl NotificationChannel for WsChannel {
    async fn next_frame(&mut self) -> Option<Result<String, MonitorError>> {
        let stream = self.stream.as_mut()?;

        while let Some(msg_result) = stream.next().await {
            match msg_result {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(_)) => {
                    tracing::trace!("Ignoring binary notification frame");
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Handled automatically by tungstenite.
                }
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "Notification socket closed by server");
                    return None;
                }
                Ok(Message::Frame(_)) => {}
                Err(e) => {
                    return Some(Err(MonitorError::ChannelUnavailable(format!(
                        "WebSocket receive error: {e}"
                    ))));
                }
            }
        }

        None
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close(None).await {
                tracing::debug!(error = %e, "Notification socket close handshake failed");
            }
        }
    }

    fn close_now(&mut self) {
        // Dropping the stream shuts the TCP connection down.
        self.stream.take();
    }
}
