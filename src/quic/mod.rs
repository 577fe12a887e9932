//! QUIC echo server and latency client
//!
//! The transport is QUIC over UDP with TLS 1.3. Both ends negotiate the
//! [`ALPN_PROTOCOL`](crate::ALPN_PROTOCOL) tag; the server presents an
//! ephemeral self-signed [`Identity`](crate::Identity).

pub mod client;
pub mod config;
pub mod server;
pub mod tls;

pub use client::QuicEchoClient;
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_ADDR, DEFAULT_MESSAGE, ServerConfig};
pub use server::{QuicEchoServer, echo_stream};
pub use tls::Verification;
