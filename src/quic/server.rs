use super::ServerConfig;
use crate::common::LoggingWriter;
use crate::security::ConnectionTracker;
use crate::{EchoError, Identity, Result};
use quinn::crypto::rustls::QuicServerConfig;
use quinn::{Endpoint, Incoming};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, warn};

/// QUIC echo server
///
/// Each accepted connection gets its own task, which echoes the first
/// bidirectional stream the peer opens and ignores any later ones.
///
/// # Examples
///
/// ```no_run
/// use netdog::{Identity, QuicEchoServer, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let identity = Identity::generate()?;
///     let server = QuicEchoServer::bind(ServerConfig::default(), &identity).await?;
///     server.serve().await?;
///     Ok(())
/// }
/// ```
pub struct QuicEchoServer {
    endpoint: Endpoint,
    config: ServerConfig,
    tracker: Arc<ConnectionTracker>,
}

impl QuicEchoServer {
    /// Binds the listening endpoint, presenting `identity` to every peer
    pub async fn bind(config: ServerConfig, identity: &Identity) -> Result<Self> {
        if config.max_connections == 0 {
            return Err(EchoError::Config("max_connections must be at least 1".to_string()));
        }

        let bind_error = |source| EchoError::Bind {
            addr: config.bind_addr.to_string(),
            source,
        };

        let addr = config.bind_addr.resolve().await.map_err(bind_error)?;

        let crypto = QuicServerConfig::try_from(identity.server_crypto()?)
            .map_err(|e| EchoError::Setup(format!("Unusable TLS config for QUIC: {e}")))?;
        let server_config = quinn::ServerConfig::with_crypto(Arc::new(crypto));

        let endpoint = Endpoint::server(server_config, addr).map_err(bind_error)?;
        let tracker = ConnectionTracker::new(config.max_connections);

        Ok(Self {
            endpoint,
            config,
            tracker,
        })
    }

    /// Address the endpoint is actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.endpoint.local_addr().map_err(EchoError::Io)
    }

    /// Completion counter shared with every spawned handler
    pub fn connection_tracker(&self) -> Arc<ConnectionTracker> {
        Arc::clone(&self.tracker)
    }

    /// Accepts connections until the endpoint fails
    ///
    /// Never returns `Ok`. An accept failure ends the loop with
    /// [`EchoError::Accept`] and cancels every in-flight handler, as does
    /// dropping the returned future.
    pub async fn serve(self) -> Result<()> {
        let root = CancellationToken::new();
        let _teardown = root.clone().drop_guard();

        info!(address = %self.local_addr()?, max_connections = self.config.max_connections, "QUIC echo server listening");

        loop {
            let Some(incoming) = self.endpoint.accept().await else {
                error!("Endpoint stopped accepting connections");
                return Err(EchoError::Accept("endpoint closed".to_string()));
            };
            let addr = incoming.remote_address();

            // At most one accepted connection waits here for a free slot
            let guard = self
                .tracker
                .acquire_connection()
                .await
                .map_err(|e| EchoError::Accept(e.to_string()))?;

            let current = self.tracker.active();
            info!(%addr, current, "Accepted connection");

            let token = root.child_token();
            let buffer_size = self.config.buffer_size;
            let span = tracing::info_span!("connection", %addr, current);

            tokio::spawn(
                async move {
                    let _guard = guard;
                    tokio::select! {
                        result = Self::handle_connection(incoming, addr, buffer_size) => {
                            if let Err(e) = result {
                                error!(%addr, error = %e, "Error handling connection");
                            }
                        }
                        _ = token.cancelled() => {
                            warn!(%addr, "Connection cancelled by server teardown");
                        }
                    }
                    info!(%addr, "Connection closed");
                }
                .instrument(span),
            );
        }
    }

    /// Completes the handshake and echoes the first stream the peer opens
    async fn handle_connection(incoming: Incoming, addr: SocketAddr, buffer_size: usize) -> Result<()> {
        let connection = incoming
            .await
            .map_err(|e| EchoError::Stream(format!("Server handshake with {addr} failed: {e}")))?;
        info!(%addr, "New session");

        let (send, mut recv) = match connection.accept_bi().await {
            Ok(stream) => stream,
            Err(e) => {
                info!(%addr, reason = %e, "Session ended before a stream was opened");
                return Ok(());
            }
        };

        let mut writer = LoggingWriter::new(send, addr);
        echo_stream(&mut recv, &mut writer, buffer_size).await?;

        // Dropping the connection early would discard unacknowledged echoes
        let reason = connection.closed().await;
        info!(%addr, reason = %reason, "Session closed by peer");
        Ok(())
    }
}

/// Echoes everything read from `reader` back through `writer` until end of data
///
/// A peer that vanishes mid-stream ends the echo quietly; any other failure
/// is returned to the owning handler.
pub async fn echo_stream<R, W>(
    reader: &mut R,
    writer: &mut LoggingWriter<W>,
    buffer_size: usize,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0; buffer_size];

    loop {
        let n = match reader.read(&mut buffer).await {
            Ok(n) => n,
            Err(e) if is_peer_gone(e.kind()) => {
                warn!(error = %e, "Stream ended abruptly");
                return Ok(());
            }
            Err(e) => return Err(EchoError::Stream(format!("Read failed: {e}"))),
        };

        if n == 0 {
            info!("Peer finished stream");
            break;
        }

        writer
            .write_all(&buffer[..n])
            .await
            .map_err(|e| EchoError::Stream(format!("Write failed: {e}")))?;
    }

    // Peer may already be gone; nothing left to deliver either way
    let _ = writer.get_mut().shutdown().await;
    Ok(())
}

fn is_peer_gone(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_echo_stream_returns_bytes_verbatim() {
        let (mut client, server) = duplex(64);
        let (mut server_read, server_write) = tokio::io::split(server);

        let echo = tokio::spawn(async move {
            let mut writer = LoggingWriter::new(server_write, "127.0.0.1:1".parse().unwrap());
            echo_stream(&mut server_read, &mut writer, 8).await
        });

        client.write_all(b"hello, echo").await.unwrap();
        let mut response = vec![0u8; 11];
        client.read_exact(&mut response).await.unwrap();
        assert_eq!(response, b"hello, echo");

        client.shutdown().await.unwrap();
        echo.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_echo_stream_stops_at_end_of_data() {
        let (client, server) = duplex(64);
        drop(client);
        let (mut server_read, server_write) = tokio::io::split(server);

        let mut writer = LoggingWriter::new(server_write, "127.0.0.1:1".parse().unwrap());
        echo_stream(&mut server_read, &mut writer, 8).await.unwrap();
    }

    #[test]
    fn test_peer_gone_classification() {
        assert!(is_peer_gone(ErrorKind::ConnectionReset));
        assert!(is_peer_gone(ErrorKind::NotConnected));
        assert!(!is_peer_gone(ErrorKind::InvalidData));
    }
}
