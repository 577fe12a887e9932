//! Common traits and types used across the netdog library
//!
//! This module contains the client trait, the logging write decorator used
//! on the server echo path, and latency aggregation for client runs.

pub mod latency;
pub mod logging_writer;
pub mod test_utils;
pub mod traits;

pub use latency::LatencyReport;
pub use logging_writer::LoggingWriter;
pub use test_utils::{connect_test_client, create_controlled_test_server_with_limit, shared_identity};
pub use traits::EchoClient;
