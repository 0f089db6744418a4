use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// Production notification socket endpoint.
pub const DEFAULT_SOCKET_URL: &str = "wss://sockets.prod.portal.onscale.com/socket/user";

/// Default ceiling on how long a job wait may take.
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 3600;

/// Longest accepted `JOB_TIMEOUT_SECS` (seven days).
pub const MAX_JOB_TIMEOUT_SECS: u64 = 7 * 24 * 3600;

/// Job monitor configuration loaded from environment variables.
///
/// All fields have defaults that target the production service. Callers
/// own the value and pass it to the connector; nothing here is global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// WebSocket endpoint of the notification service.
    pub socket_url: String,
    /// Overall deadline for one wait-for-completion call.
    pub job_timeout: Duration,
    /// Optional PEM bundle that replaces the default root certificates.
    pub ca_bundle: Option<PathBuf>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            job_timeout: Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
            ca_bundle: None,
        }
    }
}

impl MonitorSettings {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default                                             |
    /// |--------------------|-----------------------------------------------------|
    /// | `OCM_SOCKET_URL`   | `wss://sockets.prod.portal.onscale.com/socket/user` |
    /// | `JOB_TIMEOUT_SECS` | `3600` (at most `604800`)                           |
    /// | `OCM_CA_BUNDLE`    | unset (webpki roots)                                |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through
    /// `lookup`, so tests can supply variables without touching the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let socket_url = match non_empty(lookup("OCM_SOCKET_URL")) {
            Some(url) => {
                if !(url.starts_with("wss://") || url.starts_with("ws://")) {
                    return Err(CoreError::Config {
                        key: "OCM_SOCKET_URL",
                        reason: format!("expected a ws:// or wss:// URL, got {url}"),
                    });
                }
                url
            }
            None => DEFAULT_SOCKET_URL.to_string(),
        };

        let job_timeout = match non_empty(lookup("JOB_TIMEOUT_SECS")) {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| CoreError::Config {
                    key: "JOB_TIMEOUT_SECS",
                    reason: format!("not a whole number of seconds: {raw}"),
                })?;
                if secs == 0 {
                    return Err(CoreError::Config {
                        key: "JOB_TIMEOUT_SECS",
                        reason: "must be greater than zero".into(),
                    });
                }
                if secs > MAX_JOB_TIMEOUT_SECS {
                    return Err(CoreError::Config {
                        key: "JOB_TIMEOUT_SECS",
                        reason: format!("must be at most {MAX_JOB_TIMEOUT_SECS} seconds, got {secs}"),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
        };

        let ca_bundle = non_empty(lookup("OCM_CA_BUNDLE")).map(PathBuf::from);

        Ok(Self {
            socket_url,
            job_timeout,
            ca_bundle,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
