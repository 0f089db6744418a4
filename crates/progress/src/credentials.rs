//! Bearer credentials for the notification socket.
//!
//! A caller either hands the monitor a token it already holds, or a
//! reusable [`TokenProvider`] (typically the REST client's authenticated
//! session) that is asked for a token once per wait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::MonitorError;

/// Source of access tokens owned by the authentication layer.
///
/// The monitor only reads tokens; caching and refresh are the provider's
/// business.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// How to authenticate one wait.
#[derive(Clone)]
pub enum Credentials {
    /// A bearer token obtained elsewhere.
    Token(String),
    /// An existing authenticated session to reuse.
    Session(Arc<dyn TokenProvider>),
}

impl Credentials {
    /// A fixed bearer token.
    pub fn token(token: impl Into<String>) -> Self {
        Credentials::Token(token.into())
    }

    /// Ask `provider` for a token at the start of every wait.
    pub fn session(provider: Arc<dyn TokenProvider>) -> Self {
        Credentials::Session(provider)
    }

    /// Produce the bearer token to present on connect.
    pub async fn resolve(&self) -> Result<String, MonitorError> {
        match self {
            Credentials::Token(token) => Ok(token.clone()),
            Credentials::Session(provider) => provider.access_token().await.map_err(|e| {
                MonitorError::ChannelUnavailable(format!("token acquisition failed: {e}"))
            }),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Credentials::Token(<redacted>)"),
            Credentials::Session(_) => f.write_str("Credentials::Session(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;

    use super::*;

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenProvider for CountingProvider {
        async fn access_token(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("token-{n}"))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl TokenProvider for FailingProvider {
        async fn access_token(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
            Err("refresh token expired".into())
        }
    }

    #[tokio::test]
    async fn plain_token_is_returned_as_is() {
        let creds = Credentials::token("abc");
        assert_eq!(creds.resolve().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn session_is_asked_each_time() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let creds = Credentials::session(provider.clone());

        assert_eq!(creds.resolve().await.unwrap(), "token-0");
        assert_eq!(creds.resolve().await.unwrap(), "token-1");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn provider_failure_is_channel_unavailable() {
        let creds = Credentials::session(Arc::new(FailingProvider));
        assert_matches!(
            creds.resolve().await,
            Err(MonitorError::ChannelUnavailable(msg)) if msg.contains("refresh token expired")
        );
    }

    #[test]
    fn debug_hides_token() {
        let rendered = format!("{:?}", Credentials::token("secret-value"));
        assert!(!rendered.contains("secret-value"));
    }
}
