use crate::logging::LogFormat;
use crate::quic::{ClientConfig, DEFAULT_ADDR, DEFAULT_MESSAGE, ServerConfig};
use crate::{EchoError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Process configuration, built once at start-up and passed down explicitly
///
/// Values come from an optional TOML file; anything missing falls back to
/// the defaults below. Command-line flags are applied on top by the binary.
///
/// # Examples
///
/// ```
/// use netdog::AppConfig;
///
/// let config: AppConfig = toml::from_str(r#"
///     addr = "127.0.0.1:5000"
///     count = 10
/// "#).unwrap();
/// assert_eq!(config.addr, "127.0.0.1:5000");
/// assert_eq!(config.message, "foobar");
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Name of whoever is running the diagnostics
    pub developer: String,
    /// Log output variant
    pub log_format: LogFormat,
    /// Address to serve on or dial
    pub addr: String,
    /// Payload each client round trip sends
    pub message: String,
    /// Number of timed round trips
    pub count: usize,
    /// Server admission limit
    pub max_connections: usize,
    /// Client handshake limit in seconds
    pub connect_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            developer: "Unknown Developer!".to_string(),
            log_format: LogFormat::default(),
            addr: DEFAULT_ADDR.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
            count: 1,
            max_connections: ServerConfig::default().max_connections,
            connect_timeout_secs: ClientConfig::default().connect_timeout.as_secs(),
        }
    }
}

impl AppConfig {
    /// Reads a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EchoError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&contents).map_err(|e| {
            EchoError::Config(format!("Failed to parse config file {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(EchoError::Config("count must be at least 1".to_string()));
        }
        if self.max_connections == 0 {
            return Err(EchoError::Config("max_connections must be at least 1".to_string()));
        }
        self.addr.parse::<crate::Address>()?;
        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.addr.as_str().into(),
            max_connections: self.max_connections,
            ..Default::default()
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.addr, "localhost:4242");
        assert_eq!(config.message, "foobar");
        assert_eq!(config.count, 1);
        assert_eq!(config.log_format, LogFormat::Quiet);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
developer = "ops"
log_format = "verbose"
addr = "127.0.0.1:9000"
count = 5
connect_timeout_secs = 2
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.developer, "ops");
        assert_eq!(config.log_format, LogFormat::Verbose);
        assert_eq!(config.count, 5);
        assert_eq!(config.message, "foobar");
        assert_eq!(config.client_config().connect_timeout, Duration::from_secs(2));
        assert_eq!(config.server_config().bind_addr.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/netdog.toml"))).unwrap_err();
        assert!(matches!(err, EchoError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_count_and_unknown_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "count = 0").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "colour = \"blue\"").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
    }
}
