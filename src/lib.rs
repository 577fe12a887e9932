use thiserror::Error;

/// Error types for the netdog library
#[derive(Error, Debug)]
pub enum EchoError {
    /// Identity or crypto configuration could not be generated
    #[error("Setup error: {0}")]
    Setup(String),

    /// Server could not resolve or bind its listen address
    #[error("Bind error on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Client dial or handshake failure
    #[error("Connect error: {0}")]
    Connect(String),

    /// Server-level accept failure, fatal to the whole server
    #[error("Accept error: {0}")]
    Accept(String),

    /// Mid-stream read or write failure
    #[error("Stream error: {0}")]
    Stream(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 encoding errors
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result type for the netdog library
pub type Result<T> = std::result::Result<T, EchoError>;

pub mod common;
pub mod config;
pub mod harness;
pub mod identity;
pub mod logging;
pub mod network;
pub mod quic;
pub mod security;

// Re-export main types for convenience
pub use common::{EchoClient, LatencyReport, LoggingWriter};
pub use config::AppConfig;
pub use identity::{ALPN_PROTOCOL, Identity};
pub use logging::LogFormat;
pub use network::Address;
pub use quic::{ClientConfig, QuicEchoClient, QuicEchoServer, ServerConfig, Verification};
