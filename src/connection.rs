//! TCP and TLS setup
//!
//! Drafts are uploaded over implicit TLS (port 993). Certificates are
//! verified against the bundled web PKI roots unless the configuration
//! explicitly opts out, which local bridges with self-signed
//! certificates and test servers need.

use crate::config::ImapConfig;
use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};

/// A TLS-wrapped IMAP connection.
pub type ImapStream = tokio_rustls::client::TlsStream<TcpStream>;

/// Build a TLS connector, verifying certificates unless
/// `accept_invalid_certs` is set.
fn tls_connector(accept_invalid_certs: bool) -> Result<TlsConnector> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(format!("Unsupported TLS versions: {e}")))?;

    let config = if accept_invalid_certs {
        warn!("TLS certificate verification is disabled");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
            .with_no_client_auth()
    } else {
        let roots = rustls::RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        builder.with_root_certificates(roots).with_no_client_auth()
    };

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Open a TCP connection to `config.host:config.port` and complete the
/// TLS handshake.
///
/// Both steps are bounded by the configured read timeout.
pub async fn connect(config: &ImapConfig) -> Result<ImapStream> {
    let addr = format!("{}:{}", config.host, config.port);
    debug!("Connecting to IMAP server at {}", addr);

    let deadline = config.read_timeout;
    let tcp_stream = tokio::time::timeout(deadline, TcpStream::connect(&addr))
        .await
        .map_err(|_| Error::Connection(format!("Timed out connecting to {addr}")))?
        .map_err(|e| Error::Connection(format!("Failed to connect to {addr}: {e}")))?;

    let connector = tls_connector(config.accept_invalid_certs)?;
    let server_name = ServerName::try_from(config.host.clone())
        .map_err(|e| Error::Tls(format!("Invalid server name: {e}")))?;

    let tls_stream = tokio::time::timeout(deadline, connector.connect(server_name, tcp_stream))
        .await
        .map_err(|_| Error::Tls(format!("TLS handshake with {addr} timed out")))?
        .map_err(|e| Error::Tls(e.to_string()))?;

    info!("TLS connection established to {}", addr);
    Ok(tls_stream)
}

/// Certificate verifier that accepts all certificates.
#[derive(Debug)]
struct AcceptAnyCertificate;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
