use crate::quic::{ClientConfig, QuicEchoClient, QuicEchoServer, ServerConfig, Verification};
use crate::{Identity, Result};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Identity shared by every test server in this process
///
/// RSA key generation dominates test runtime, so tests reuse one identity.
pub fn shared_identity() -> Result<&'static Identity> {
    static IDENTITY: OnceLock<Identity> = OnceLock::new();
    if let Some(identity) = IDENTITY.get() {
        return Ok(identity);
    }
    let identity = Identity::generate()?;
    Ok(IDENTITY.get_or_init(|| identity))
}

/// Creates a controlled test server with connection limit for integration tests
///
/// The server is bound before this returns, on an ephemeral loopback port,
/// and runs in a background task the caller is expected to abort.
pub async fn create_controlled_test_server_with_limit(
    max_connections: usize,
) -> Result<(JoinHandle<Result<()>>, SocketAddr)> {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".into(),
        max_connections,
        ..Default::default()
    };

    let server = QuicEchoServer::bind(config, shared_identity()?).await?;
    let addr = server.local_addr()?;

    let server_handle = tokio::spawn(async move { server.serve().await });

    Ok((server_handle, addr))
}

/// Dials a test server with a short handshake timeout and no verification
pub async fn connect_test_client(addr: SocketAddr) -> Result<QuicEchoClient> {
    let config = ClientConfig {
        connect_timeout: Duration::from_secs(5),
        ..Default::default()
    };
    QuicEchoClient::dial_with_config(addr, Verification::SkipVerification, config).await
}
