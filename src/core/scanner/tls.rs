// src/core/scanner/tls.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, ProtocolVersion, RootCertStore, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::{debug, info, warn};
use x509_parser::prelude::*;

use crate::core::error::ConfigError;
use crate::core::models::{CertificateInfo, TlsInfo};

static ROOT_STORE: Lazy<Arc<RootCertStore>> = Lazy::new(|| {
    Arc::new(RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    })
});

/// Certificate verifier used when verification is disabled: any chain is accepted,
/// but handshake signatures are still checked so the session itself is sound.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// Builds the connector used for the timed handshake.
///
/// # Arguments
/// * `verify` - When `false`, certificate chain and hostname checks are skipped.
pub fn build_connector(verify: bool) -> Result<TlsConnector, ConfigError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| ConfigError::Tls(e.to_string()))?;

    let config = if verify {
        builder
            .with_root_certificates(ROOT_STORE.clone())
            .with_no_client_auth()
    } else {
        warn!("TLS certificate verification is disabled.");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
            .with_no_client_auth()
    };

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Performs the TLS handshake over an established TCP stream.
///
/// # Returns
/// The encrypted stream and the negotiated session metadata, or a human-readable
/// error when the server name is unusable or the handshake fails.
pub async fn handshake(
    connector: &TlsConnector,
    hostname: &str,
    tcp: TcpStream,
) -> Result<(TlsStream<TcpStream>, TlsInfo), String> {
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|e| format!("invalid server name '{hostname}': {e}"))?;

    debug!(hostname, "Performing TLS handshake.");
    let stream = connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| format!("TLS handshake failed: {e}"))?;

    let info = session_info(stream.get_ref().1);
    info!(
        hostname,
        protocol = %info.protocol,
        cipher = %info.cipher_suite,
        "TLS handshake complete."
    );
    Ok((stream, info))
}

/// Extracts protocol, cipher suite and leaf certificate details from a finished session.
pub fn session_info(conn: &ClientConnection) -> TlsInfo {
    let protocol = conn
        .protocol_version()
        .map(protocol_name)
        .unwrap_or_else(|| "unknown".to_string());
    let cipher_suite = conn
        .negotiated_cipher_suite()
        .map(|suite| format!("{:?}", suite.suite()))
        .unwrap_or_else(|| "unknown".to_string());
    let certificate = conn
        .peer_certificates()
        .and_then(|chain| chain.first())
        .and_then(|leaf| parse_certificate(leaf.as_ref()));

    TlsInfo {
        protocol,
        cipher_suite,
        certificate,
    }
}

fn protocol_name(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        other => format!("{other:?}"),
    }
}

/// Parses a DER-encoded certificate into the fields shown to the user.
pub fn parse_certificate(der: &[u8]) -> Option<CertificateInfo> {
    let (_, x509) = match parse_x509_certificate(der) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Failed to parse X.509 certificate.");
            return None;
        }
    };

    let validity = x509.validity();
    let not_after = asn1_time_to_chrono_utc(&validity.not_after);
    let not_before = asn1_time_to_chrono_utc(&validity.not_before);
    let now = Utc::now();

    debug!(subject = %x509.subject(), issuer = %x509.issuer(), "Parsed peer certificate.");
    Some(CertificateInfo {
        subject_name: x509.subject().to_string(),
        issuer_name: x509.issuer().to_string(),
        not_before,
        not_after,
        days_until_expiry: not_after.signed_duration_since(now).num_days(),
        is_valid: now > not_before && now < not_after,
    })
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectors_build_in_both_modes() {
        assert!(build_connector(true).is_ok());
        assert!(build_connector(false).is_ok());
    }

    #[test]
    fn test_protocol_names() {
        assert_eq!(protocol_name(ProtocolVersion::TLSv1_3), "TLSv1.3");
        assert_eq!(protocol_name(ProtocolVersion::TLSv1_2), "TLSv1.2");
    }

    #[test]
    fn test_parse_certificate_rejects_garbage() {
        assert!(parse_certificate(b"not a certificate").is_none());
        assert!(parse_certificate(&[]).is_none());
    }

    #[test]
    fn test_asn1_time_conversion() {
        let time = ASN1Time::from_timestamp(1_700_000_000).unwrap();
        assert_eq!(asn1_time_to_chrono_utc(&time).timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_handshake_rejects_invalid_server_name() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let tcp = TcpStream::connect(addr).await.unwrap();
        let connector = build_connector(true).unwrap();

        match handshake(&connector, "bad name!", tcp).await {
            Err(err) => assert!(err.contains("invalid server name")),
            Ok(_) => panic!("handshake with an invalid server name succeeded"),
        }
    }
}
