//! Ephemeral self-signed identity used to encrypt the QUIC transport
//!
//! The identity is regenerated on every process start and is never
//! persisted. It only bootstraps transport encryption: clients either skip
//! verification entirely or trust this exact certificate.

use crate::{EchoError, Result};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use rsa::RsaPrivateKey;
use rsa::pkcs8::EncodePrivateKey;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::sync::Arc;
use tracing::debug;

/// Application protocol negotiated during the handshake
pub const ALPN_PROTOCOL: &[u8] = b"quic-echo-example";

/// Server name the certificate is issued for and the client dials
pub const SERVER_NAME: &str = "localhost";

/// RSA modulus size for generated keys
const RSA_KEY_BITS: usize = 2048;

/// Key pair plus self-signed certificate for one process lifetime
///
/// # Examples
///
/// ```no_run
/// use netdog::Identity;
///
/// let identity = Identity::generate().expect("identity generation");
/// assert!(!identity.certificate().is_empty());
/// ```
#[derive(Debug)]
pub struct Identity {
    certificate: CertificateDer<'static>,
    key_der: PrivatePkcs8KeyDer<'static>,
}

impl Identity {
    /// Generates a fresh RSA key pair and a certificate signed by itself
    pub fn generate() -> Result<Self> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
            .map_err(|e| EchoError::Setup(format!("Failed to generate RSA key: {e}")))?;
        let pkcs8 = private_key
            .to_pkcs8_der()
            .map_err(|e| EchoError::Setup(format!("Failed to encode RSA key: {e}")))?;

        let key_pair = KeyPair::try_from(pkcs8.as_bytes())
            .map_err(|e| EchoError::Setup(format!("Failed to load RSA key pair: {e}")))?;

        let mut params = CertificateParams::new(vec![SERVER_NAME.to_string()])
            .map_err(|e| EchoError::Setup(format!("Invalid certificate name: {e}")))?;
        let mut dname = DistinguishedName::new();
        dname.push(DnType::CommonName, "netdog self-signed");
        params.distinguished_name = dname;

        let cert = params
            .self_signed(&key_pair)
            .map_err(|e| EchoError::Setup(format!("Failed to self-sign certificate: {e}")))?;

        debug!(bits = RSA_KEY_BITS, "Generated ephemeral identity");

        Ok(Self {
            certificate: cert.der().clone(),
            key_der: PrivatePkcs8KeyDer::from(pkcs8.as_bytes().to_vec()),
        })
    }

    /// DER encoded certificate, for clients that want to trust it explicitly
    pub fn certificate(&self) -> &CertificateDer<'static> {
        &self.certificate
    }

    /// TLS server configuration presenting this identity with the echo ALPN tag
    pub fn server_crypto(&self) -> Result<rustls::ServerConfig> {
        let mut crypto = rustls::ServerConfig::builder_with_provider(crypto_provider())
            .with_protocol_versions(&[&rustls::version::TLS13])
            .map_err(|e| EchoError::Setup(format!("Unsupported TLS versions: {e}")))?
            .with_no_client_auth()
            .with_single_cert(
                vec![self.certificate.clone()],
                PrivateKeyDer::Pkcs8(self.key_der.clone_key()),
            )
            .map_err(|e| EchoError::Setup(format!("Invalid server certificate: {e}")))?;
        crypto.alpn_protocols = vec![ALPN_PROTOCOL.to_vec()];
        Ok(crypto)
    }
}

/// Crypto provider shared by server and client TLS configs
pub(crate) fn crypto_provider() -> Arc<rustls::crypto::CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}
