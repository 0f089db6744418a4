//! TLS trust configuration for the notification socket.
//!
//! The client config is built once per [`OcmConnector`](crate::client::OcmConnector)
//! and shared by every connection it opens. A configured custom bundle
//! replaces the default roots entirely; if it cannot be loaded the build
//! fails instead of quietly falling back.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use conceptev_core::settings::MonitorSettings;
use rustls::{ClientConfig, RootCertStore};

use crate::error::MonitorError;

/// Which root certificates the notification socket trusts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TrustConfig {
    /// The bundled webpki (Mozilla) root set.
    #[default]
    SystemRoots,
    /// Only the certificates in this PEM file.
    CustomBundle(PathBuf),
}

impl TrustConfig {
    /// The custom bundle from `settings.ca_bundle`, or the webpki roots.
    pub fn from_settings(settings: &MonitorSettings) -> Self {
        match &settings.ca_bundle {
            Some(path) => TrustConfig::CustomBundle(path.clone()),
            None => TrustConfig::SystemRoots,
        }
    }
}

/// Build the rustls client configuration for `trust`.
pub fn build_client_config(trust: &TrustConfig) -> Result<Arc<ClientConfig>, MonitorError> {
    let roots = match trust {
        TrustConfig::SystemRoots => {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            roots
        }
        TrustConfig::CustomBundle(path) => load_bundle(path)?,
    };

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| MonitorError::Tls(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(Arc::new(config))
}

fn load_bundle(path: &Path) -> Result<RootCertStore, MonitorError> {
    let file = File::open(path).map_err(|e| {
        MonitorError::Tls(format!("cannot read CA bundle {}: {e}", path.display()))
    })?;
    let mut reader = BufReader::new(file);

    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| MonitorError::Tls(format!("malformed CA bundle {}: {e}", path.display())))?;

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs);
    require_all_parsed(path, added, ignored)?;

    tracing::debug!(
        path = %path.display(),
        added,
        "Loaded custom CA bundle",
    );

    Ok(roots)
}

/// A bundle must contain at least one certificate, and every certificate
/// in it must parse.
fn require_all_parsed(path: &Path, added: usize, ignored: usize) -> Result<(), MonitorError> {
    if ignored > 0 {
        return Err(MonitorError::Tls(format!(
            "CA bundle {} contains {ignored} unparsable certificate(s)",
            path.display()
        )));
    }
    if added == 0 {
        return Err(MonitorError::Tls(format!(
            "CA bundle {} contains no usable certificates",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn system_roots_build() {
        assert!(build_client_config(&TrustConfig::SystemRoots).is_ok());
    }

    #[test]
    fn missing_bundle_fails_fast() {
        let trust = TrustConfig::CustomBundle(PathBuf::from("/nonexistent/conceptev/ca.pem"));
        assert_matches!(build_client_config(&trust), Err(MonitorError::Tls(msg)) if msg.contains("cannot read"));
    }

    #[test]
    fn bundle_without_certificates_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not a certificate").unwrap();

        let trust = TrustConfig::CustomBundle(file.path().to_path_buf());
        assert_matches!(build_client_config(&trust), Err(MonitorError::Tls(_)));
    }

    #[test]
    fn corrupt_pem_block_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "-----BEGIN CERTIFICATE-----").unwrap();
        writeln!(file, "!!!! not base64 !!!!").unwrap();
        writeln!(file, "-----END CERTIFICATE-----").unwrap();

        let trust = TrustConfig::CustomBundle(file.path().to_path_buf());
        assert_matches!(build_client_config(&trust), Err(MonitorError::Tls(_)));
    }

    #[test]
    fn undecodable_certificate_is_rejected() {
        // Valid base64, but the bytes are not a DER certificate.
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "-----BEGIN CERTIFICATE-----").unwrap();
        writeln!(file, "AAAA").unwrap();
        writeln!(file, "-----END CERTIFICATE-----").unwrap();

        let trust = TrustConfig::CustomBundle(file.path().to_path_buf());
        assert_matches!(build_client_config(&trust), Err(MonitorError::Tls(msg)) if msg.contains("unparsable"));
    }

    #[test]
    fn one_bad_certificate_fails_the_whole_bundle() {
        let path = Path::new("/etc/ssl/mixed.pem");
        assert!(require_all_parsed(path, 3, 0).is_ok());
        assert_matches!(require_all_parsed(path, 1, 1), Err(MonitorError::Tls(msg)) if msg.contains("1 unparsable"));
        assert_matches!(require_all_parsed(path, 0, 0), Err(MonitorError::Tls(msg)) if msg.contains("no usable"));
    }

    #[test]
    fn trust_follows_settings() {
        let mut settings = MonitorSettings::default();
        assert_eq!(TrustConfig::from_settings(&settings), TrustConfig::SystemRoots);

        settings.ca_bundle = Some(PathBuf::from("/etc/ssl/corp.pem"));
        assert_eq!(
            TrustConfig::from_settings(&settings),
            TrustConfig::CustomBundle(PathBuf::from("/etc/ssl/corp.pem"))
        );
    }
}
