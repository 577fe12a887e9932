use crate::identity::SERVER_NAME;
use crate::network::Address;
use std::time::Duration;

/// Address used by every subcommand when none is given
pub const DEFAULT_ADDR: &str = "localhost:4242";

/// Message sent by the client when none is given
pub const DEFAULT_MESSAGE: &str = "foobar";

/// Configuration for the QUIC echo server
///
/// # Examples
///
/// ```
/// use netdog::quic::ServerConfig;
///
/// let config = ServerConfig {
///     bind_addr: "127.0.0.1:4242".into(),
///     max_connections: 100,
///     buffer_size: 4096,
/// };
/// assert_eq!(config.bind_addr.to_string(), "127.0.0.1:4242");
/// ```
///
/// Using the default configuration:
///
/// ```
/// use netdog::quic::ServerConfig;
///
/// let config = ServerConfig::default();
/// assert_eq!(config.bind_addr.to_string(), "localhost:4242");
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_addr: Address,
    /// Maximum number of connections served at once
    pub max_connections: usize,
    /// Read buffer size per connection
    pub buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.into(),
            max_connections: 1024,
            buffer_size: 4096,
        }
    }
}

/// Configuration for the QUIC echo client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound on the handshake
    pub connect_timeout: Duration,
    /// Name presented for SNI and checked against a trusted certificate
    pub server_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            server_name: SERVER_NAME.to_string(),
        }
    }
}

/// Builder for client configuration
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.config.server_name = name.into();
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
