//! Structured log output for the `netdog` binary

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "netdog=info";

/// Log output variants, picked once at start-up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Flat JSON records without timestamps or span context
    #[default]
    Quiet,
    /// JSON records with timestamps, targets, thread ids and span context
    Verbose,
}

/// Installs the global tracing subscriber for `format`
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match format {
        LogFormat::Quiet => tracing_subscriber::fmt()
            .json()
            .without_time()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .with_target(false)
            .with_env_filter(filter)
            .init(),
        LogFormat::Verbose => tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_thread_ids(true)
            .with_target(true)
            .with_env_filter(filter)
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        format: LogFormat,
    }

    #[test]
    fn test_default_is_quiet() {
        assert_eq!(LogFormat::default(), LogFormat::Quiet);
    }

    #[test]
    fn test_deserialize_lowercase() {
        let parsed: Wrapper = toml::from_str("format = \"verbose\"").unwrap();
        assert_eq!(parsed.format, LogFormat::Verbose);
        assert!(toml::from_str::<Wrapper>("format = \"loud\"").is_err());
    }
}
