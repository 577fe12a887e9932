use crate::{EchoError, Result};
use async_trait::async_trait;

/// Common trait for echo clients
///
/// A single call is one untimed round trip: the payload is written and
/// exactly as many bytes are read back.
#[async_trait]
pub trait EchoClient {
    /// Sends data to the echo server and returns the echoed response
    async fn echo(&mut self, data: &[u8]) -> Result<Vec<u8>>;

    /// Sends a string and returns the echoed string
    async fn echo_string(&mut self, data: &str) -> Result<String> {
        let response = self.echo(data.as_bytes()).await?;
        String::from_utf8(response).map_err(EchoError::Utf8)
    }
}
