//! Client-side TLS configuration for the echo transport

use crate::identity::{ALPN_PROTOCOL, crypto_provider};
use crate::{EchoError, Result};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::sync::Arc;

/// How the client treats the server certificate
#[derive(Debug, Clone, Default)]
pub enum Verification {
    /// Accept whatever certificate the server presents
    #[default]
    SkipVerification,
    /// Trust exactly this certificate and nothing else
    TrustCertificate(CertificateDer<'static>),
}

/// Builds the rustls client config for a verification mode
pub fn client_crypto(verification: &Verification) -> Result<rustls::ClientConfig> {
    let builder = rustls::ClientConfig::builder_with_provider(crypto_provider())
        .with_protocol_versions(&[&rustls::version::TLS13])
        .map_err(|e| EchoError::Setup(format!("Unsupported TLS versions: {e}")))?;

    let mut crypto = match verification {
        Verification::SkipVerification => builder
            .dangerous()
            .with_custom_certificate_verifier(SkipServerVerification::new())
            .with_no_client_auth(),
        Verification::TrustCertificate(cert) => {
            let mut roots = rustls::RootCertStore::empty();
            roots
                .add(cert.clone())
                .map_err(|e| EchoError::Setup(format!("Untrustable certificate: {e}")))?;
            builder.with_root_certificates(roots).with_no_client_auth()
        }
    };
    crypto.alpn_protocols = vec![ALPN_PROTOCOL.to_vec()];
    Ok(crypto)
}

/// Verifier that accepts any server certificate but still checks handshake signatures
#[derive(Debug)]
struct SkipServerVerification(Arc<CryptoProvider>);

impl SkipServerVerification {
    fn new() -> Arc<Self> {
        Arc::new(Self(crypto_provider()))
    }
}

impl ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_verification_sets_alpn() {
        let crypto = client_crypto(&Verification::SkipVerification).unwrap();
        assert_eq!(crypto.alpn_protocols, vec![ALPN_PROTOCOL.to_vec()]);
    }

    #[test]
    fn test_default_is_skip_verification() {
        assert!(matches!(Verification::default(), Verification::SkipVerification));
    }
}
