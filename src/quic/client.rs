use super::{ClientConfig, Verification, tls};
use crate::common::{EchoClient, LatencyReport};
use crate::network::Address;
use crate::{EchoError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use quinn::crypto::rustls::QuicClientConfig;
use quinn::{Connection, Endpoint, RecvStream, SendStream};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::{Instant, timeout};
use tracing::{debug, info};

/// QUIC echo client bound to one connection and one stream
///
/// Every round trip, timed or not, travels over the same bidirectional
/// stream: the server only ever echoes the first stream a peer opens.
pub struct QuicEchoClient {
    endpoint: Endpoint,
    connection: Connection,
    stream: Option<(SendStream, RecvStream)>,
}

impl QuicEchoClient {
    /// Dial with default configuration
    pub async fn dial<A: Into<Address>>(address: A, verification: Verification) -> Result<Self> {
        Self::dial_with_config(address, verification, ClientConfig::default()).await
    }

    /// Resolves `address` and completes the handshake within `connect_timeout`
    pub async fn dial_with_config<A: Into<Address>>(
        address: A,
        verification: Verification,
        config: ClientConfig,
    ) -> Result<Self> {
        let address = address.into();
        let remote = address
            .resolve()
            .await
            .map_err(|e| EchoError::Connect(format!("Failed to resolve {address}: {e}")))?;

        let crypto = QuicClientConfig::try_from(tls::client_crypto(&verification)?)
            .map_err(|e| EchoError::Setup(format!("Unusable TLS config for QUIC: {e}")))?;

        let mut endpoint = Endpoint::client(unspecified_for(remote))
            .map_err(|e| EchoError::Connect(format!("Failed to open client socket: {e}")))?;
        endpoint.set_default_client_config(quinn::ClientConfig::new(Arc::new(crypto)));

        let connecting = endpoint
            .connect(remote, &config.server_name)
            .map_err(|e| EchoError::Connect(format!("Failed to start handshake with {remote}: {e}")))?;

        let connection = timeout(config.connect_timeout, connecting)
            .await
            .map_err(|_| {
                EchoError::Connect(format!(
                    "Handshake with {remote} timed out after {:?}",
                    config.connect_timeout
                ))
            })?
            .map_err(|e| EchoError::Connect(format!("Handshake with {remote} failed: {e}")))?;

        info!(%remote, "Connected to echo server");

        Ok(Self {
            endpoint,
            connection,
            stream: None,
        })
    }

    pub fn remote_address(&self) -> SocketAddr {
        self.connection.remote_address()
    }

    /// Warm-up round trip followed by `count` timed round trips
    ///
    /// The warm-up absorbs stream setup cost and is never recorded. Any
    /// failure aborts the run without a partial report.
    pub async fn run(&mut self, message: impl Into<Bytes>, count: usize) -> Result<LatencyReport> {
        let message = message.into();
        let mut report = LatencyReport::new();

        self.round_trip(&message).await?;

        for _ in 0..count {
            info!(sent = %String::from_utf8_lossy(&message), "Client: Sending");
            let start = Instant::now();
            let response = self.round_trip(&message).await?;
            let elapsed = start.elapsed();

            info!(response = %String::from_utf8_lossy(&response), elapsed_us = elapsed.as_micros() as u64, "Client: Got");
            report.record(elapsed, response);
        }

        Ok(report)
    }

    /// Finishes the stream and closes the connection
    pub async fn close(mut self) {
        if let Some((mut send, mut recv)) = self.stream.take() {
            let _ = send.finish();
            // Wait for the server to finish its side so no echo is cut short
            if let Err(e) = recv.read_to_end(usize::MAX).await {
                debug!(error = %e, "Stream did not end cleanly");
            }
        }
        self.connection.close(0u32.into(), b"done");
        self.endpoint.wait_idle().await;
    }

    /// Opens the single stream on first use
    async fn stream(&mut self) -> Result<&mut (SendStream, RecvStream)> {
        if self.stream.is_none() {
            let stream = self
                .connection
                .open_bi()
                .await
                .map_err(|e| EchoError::Stream(format!("Failed to open stream: {e}")))?;
            self.stream = Some(stream);
        }
        self.stream
            .as_mut()
            .ok_or_else(|| EchoError::Stream("Stream unavailable".to_string()))
    }

    /// Writes `message` and reads back exactly as many bytes
    async fn round_trip(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        let (send, recv) = self.stream().await?;

        send.write_all(message)
            .await
            .map_err(|e| EchoError::Stream(format!("Write failed: {e}")))?;

        let mut response = vec![0u8; message.len()];
        recv.read_exact(&mut response)
            .await
            .map_err(|e| EchoError::Stream(format!("Read failed: {e}")))?;

        Ok(response)
    }
}

#[async_trait]
impl EchoClient for QuicEchoClient {
    async fn echo(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.round_trip(data).await
    }
}

/// Wildcard local address in the same family as `remote`
fn unspecified_for(remote: SocketAddr) -> SocketAddr {
    if remote.is_ipv6() {
        SocketAddr::from(([0u16; 8], 0))
    } else {
        SocketAddr::from(([0u8; 4], 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unspecified_matches_family() {
        let v4: SocketAddr = "127.0.0.1:4242".parse().unwrap();
        let v6: SocketAddr = "[::1]:4242".parse().unwrap();

        assert!(unspecified_for(v4).is_ipv4());
        assert!(unspecified_for(v6).is_ipv6());
        assert_eq!(unspecified_for(v4).port(), 0);
    }
}
