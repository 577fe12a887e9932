use std::net::SocketAddr;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;

/// Byte sink decorator that logs every payload before forwarding it
///
/// The log event is emitted before the underlying write starts, so a record
/// can exist for bytes that never reached the peer.
///
/// # Examples
///
/// ```
/// use netdog::LoggingWriter;
///
/// # tokio_test::block_on(async {
/// let mut writer = LoggingWriter::new(Vec::new(), "127.0.0.1:4242".parse().unwrap());
/// writer.write_all(b"foobar").await.unwrap();
/// assert_eq!(writer.into_inner(), b"foobar");
/// # });
/// ```
#[derive(Debug)]
pub struct LoggingWriter<W> {
    inner: W,
    peer: SocketAddr,
}

impl<W: AsyncWrite + Unpin> LoggingWriter<W> {
    pub fn new(inner: W, peer: SocketAddr) -> Self {
        Self { inner, peer }
    }

    /// Logs `data`, then writes all of it to the wrapped sink
    ///
    /// Valid UTF-8 is logged as text; anything else as escaped bytes.
    pub async fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        match std::str::from_utf8(data) {
            Ok(text) => info!(addr = %self.peer, size = data.len(), payload = %text, "Server: Got"),
            Err(_) => info!(addr = %self.peer, size = data.len(), payload = %data.escape_ascii(), "Server: Got"),
        }

        self.inner.write_all(data).await?;
        self.inner.flush().await
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
