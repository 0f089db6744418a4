use clap::Parser;
use conceptev_core::error::CoreError;
use conceptev_core::settings::MonitorSettings;
use conceptev_core::types::JobId;

/// Command line of `conceptev-monitor`.
///
/// Every argument falls back to an environment variable, so the binary can
/// run from a `.env` file alone.
#[derive(Debug, Clone, Parser)]
#[command(name = "conceptev-monitor", version)]
#[command(about = "Wait for a ConceptEV job to reach a terminal status", long_about = None)]
pub struct Cli {
    /// Job to wait on
    #[arg(env = "JOB_ID")]
    pub job_id: String,

    /// User id for the notification socket
    #[arg(long, env = "OCM_USER_ID")]
    pub user_id: String,

    /// Bearer token for the notification socket
    #[arg(long, env = "OCM_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Notification socket URL
    #[arg(long, env = "OCM_SOCKET_URL")]
    pub socket_url: Option<String>,

    /// Give up after this many seconds
    #[arg(long, env = "JOB_TIMEOUT_SECS")]
    pub timeout_secs: Option<String>,

    /// PEM file of trusted root certificates
    #[arg(long, env = "OCM_CA_BUNDLE")]
    pub ca_bundle: Option<String>,
}

/// Everything the binary needs to wait on one job.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub job_id: JobId,
    pub user_id: String,
    pub token: String,
    pub settings: MonitorSettings,
}

impl CliConfig {
    /// Validate parsed arguments.
    ///
    /// Settings go through [`MonitorSettings::from_lookup`], so the
    /// command line and the library apply the same rules.
    pub fn from_cli(cli: Cli) -> Result<Self, CoreError> {
        let job_id = JobId::new(cli.job_id).map_err(|e| CoreError::Config {
            key: "JOB_ID",
            reason: e.to_string(),
        })?;
        let user_id = required("OCM_USER_ID", cli.user_id)?;
        let token = required("OCM_TOKEN", cli.token)?;

        let settings = MonitorSettings::from_lookup(|key| match key {
            "OCM_SOCKET_URL" => cli.socket_url.clone(),
            "JOB_TIMEOUT_SECS" => cli.timeout_secs.clone(),
            "OCM_CA_BUNDLE" => cli.ca_bundle.clone(),
            _ => None,
        })?;

        Ok(Self {
            job_id,
            user_id,
            token,
            settings,
        })
    }
}

fn required(key: &'static str, value: String) -> Result<String, CoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::Config {
            key,
            reason: "must not be blank".into(),
        });
    }
    Ok(value.to_string())
}
