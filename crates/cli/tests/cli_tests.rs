//! Integration tests for `conceptev-monitor` configuration and exit codes.

use std::time::Duration;

use assert_matches::assert_matches;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use conceptev_cli::config::{Cli, CliConfig};
use conceptev_cli::exit::{exit_code, EXIT_CHANNEL, EXIT_CONFIG, EXIT_JOB_FAILED, EXIT_TIMEOUT};
use conceptev_core::error::CoreError;
use conceptev_core::types::JobId;
use conceptev_progress::MonitorError;

const BIN: &str = "conceptev-monitor";

/// Parse `args` after the program name, always passing the credentials
/// as flags so nothing depends on the process environment.
fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    let mut argv = vec![BIN, "--user-id", "user-1", "--token", "tok"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv)
}

fn cli(job_id: &str) -> Cli {
    parse(&[job_id]).unwrap()
}

// ---------------------------------------------------------------------------
// Test: command line
// ---------------------------------------------------------------------------

#[test]
fn command_definition_is_valid() {
    Cli::command().debug_assert();
}

/// `--help` prints usage instead of being taken as a job id.
#[test]
fn help_flag_displays_usage() {
    let err = Cli::try_parse_from([BIN, "--help"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    assert!(err.to_string().contains("--user-id"));
}

#[test]
fn unknown_flag_is_rejected() {
    let err = parse(&["job-1", "--bogus"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownArgument);
}

/// Only one job id is accepted; a second positional is not dropped silently.
#[test]
fn extra_positional_is_rejected() {
    let err = parse(&["job-1", "job-2"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownArgument);
}

#[test]
fn positional_job_id_and_credential_flags() {
    let config = CliConfig::from_cli(cli("job-42")).unwrap();

    assert_eq!(config.job_id.as_str(), "job-42");
    assert_eq!(config.user_id, "user-1");
    assert_eq!(config.token, "tok");
}

// ---------------------------------------------------------------------------
// Test: configuration
// ---------------------------------------------------------------------------

/// Settings flags go through the same validation as the environment.
#[test]
fn settings_flags_are_applied() {
    let parsed = parse(&[
        "job-42",
        "--timeout-secs",
        "120",
        "--socket-url",
        "ws://localhost:9999/socket/user",
        "--ca-bundle",
        "/etc/ssl/custom.pem",
    ])
    .unwrap();

    let config = CliConfig::from_cli(parsed).unwrap();

    assert_eq!(config.settings.job_timeout, Duration::from_secs(120));
    assert_eq!(config.settings.socket_url, "ws://localhost:9999/socket/user");
    assert_eq!(
        config.settings.ca_bundle.as_deref(),
        Some(std::path::Path::new("/etc/ssl/custom.pem"))
    );
}

#[test]
fn blank_job_id_is_config_error() {
    let result = CliConfig::from_cli(cli("  "));
    assert_matches!(result, Err(CoreError::Config { key: "JOB_ID", .. }));
}

#[test]
fn blank_user_id_is_config_error() {
    let mut parsed = cli("job");
    parsed.user_id = "  ".into();
    let result = CliConfig::from_cli(parsed);
    assert_matches!(result, Err(CoreError::Config { key: "OCM_USER_ID", .. }));
}

#[test]
fn blank_token_is_config_error() {
    let mut parsed = cli("job");
    parsed.token = String::new();
    let result = CliConfig::from_cli(parsed);
    assert_matches!(result, Err(CoreError::Config { key: "OCM_TOKEN", .. }));
}

#[test]
fn invalid_timeout_is_config_error() {
    for raw in ["--timeout-secs=-5", "--timeout-secs=soon", "--timeout-secs=99999999999"] {
        let result = CliConfig::from_cli(parse(&["job", raw]).unwrap());
        assert_matches!(
            result,
            Err(CoreError::Config {
                key: "JOB_TIMEOUT_SECS",
                ..
            }),
            "{raw}"
        );
    }
}

// ---------------------------------------------------------------------------
// Test: exit codes
// ---------------------------------------------------------------------------

#[test]
fn exit_codes_distinguish_outcomes() {
    let job = JobId::new("job").unwrap();

    let failed = MonitorError::JobFailed {
        job_id: job.clone(),
        status: "FAILED".into(),
        payload: serde_json::json!({"status": "FAILED"}),
    };
    let timeout = MonitorError::Timeout {
        job_id: job.clone(),
        waited: Duration::from_secs(1),
    };

    assert_eq!(exit_code(&failed), EXIT_JOB_FAILED);
    assert_eq!(exit_code(&timeout), EXIT_TIMEOUT);
    assert_eq!(
        exit_code(&MonitorError::ChannelUnavailable("refused".into())),
        EXIT_CHANNEL
    );
    assert_eq!(exit_code(&MonitorError::Tls("bad bundle".into())), EXIT_CONFIG);
}
