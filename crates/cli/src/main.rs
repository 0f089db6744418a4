//! `conceptev-monitor` -- wait for a ConceptEV job to finish.
//!
//! Connects to the notification service, waits until the job reports a
//! terminal status, prints that status on stdout and exits. Scripts can
//! branch on the exit code (see [`conceptev_cli::exit`]).
//!
//! ```text
//! conceptev-monitor [OPTIONS] --user-id <USER_ID> --token <TOKEN> <JOB_ID>
//! ```
//!
//! # Environment variables
//!
//! Each argument can instead come from the environment (or `.env`):
//!
//! | Variable           | Argument         | Default | Description                              |
//! |--------------------|------------------|---------|------------------------------------------|
//! | `JOB_ID`           | `<JOB_ID>`       | --      | Job to wait on                           |
//! | `OCM_USER_ID`      | `--user-id`      | --      | User id for the notification socket      |
//! | `OCM_TOKEN`        | `--token`        | --      | Bearer token for the notification socket |
//! | `OCM_SOCKET_URL`   | `--socket-url`   | production endpoint | Notification socket URL      |
//! | `JOB_TIMEOUT_SECS` | `--timeout-secs` | `3600`  | Give up after this many seconds (max 7 days) |
//! | `OCM_CA_BUNDLE`    | `--ca-bundle`    | --      | PEM file of trusted root certificates    |

use clap::Parser;
use conceptev_cli::config::{Cli, CliConfig};
use conceptev_cli::exit::{exit_code, EXIT_CONFIG, EXIT_OK};
use conceptev_progress::{Credentials, JobMonitor};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conceptev_progress=info,conceptev_monitor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Usage errors share the configuration exit code; help and version
    // exit cleanly.
    let cli = Cli::try_parse().unwrap_or_else(|e| {
        if e.use_stderr() {
            let _ = e.print();
            std::process::exit(EXIT_CONFIG);
        }
        e.exit()
    });

    let config = CliConfig::from_cli(cli).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(EXIT_CONFIG);
    });

    tracing::info!(
        job_id = %config.job_id,
        socket_url = %config.settings.socket_url,
        timeout_secs = config.settings.job_timeout.as_secs(),
        "Starting conceptev-monitor",
    );

    let monitor = JobMonitor::from_settings(&config.settings).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to set up notification client");
        std::process::exit(EXIT_CONFIG);
    });

    let credentials = Credentials::token(config.token);

    match monitor.wait_for_completion_blocking(&config.job_id, &config.user_id, &credentials) {
        Ok(status) => {
            println!("{status}");
            std::process::exit(EXIT_OK);
        }
        Err(e) => {
            tracing::error!(job_id = %config.job_id, error = %e, "Job did not complete");
            std::process::exit(exit_code(&e));
        }
    }
}
