use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use tokio::net::lookup_host;

/// Endpoint address, either a literal socket address or a `host:port` name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// Literal socket address
    Socket(SocketAddr),
    /// Host name with port, resolved on use
    Host(String),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Socket(addr) => write!(f, "{addr}"),
            Address::Host(host) => write!(f, "{host}"),
        }
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        Address::Socket(addr)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        match s.parse::<SocketAddr>() {
            Ok(addr) => Address::Socket(addr),
            Err(_) => Address::Host(s.to_string()),
        }
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Address::from(s.as_str())
    }
}

impl FromStr for Address {
    type Err = crate::EchoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Ok(Address::from(s))
            }
            _ => Err(crate::EchoError::Config(format!(
                "Invalid address '{s}': expected host:port"
            ))),
        }
    }
}

impl Address {
    /// Returns true if this is a literal socket address
    pub fn is_socket(&self) -> bool {
        matches!(self, Address::Socket(_))
    }

    /// Get the socket address if no resolution is needed
    pub fn as_socket(&self) -> Option<&SocketAddr> {
        match self {
            Address::Socket(addr) => Some(addr),
            Address::Host(_) => None,
        }
    }

    /// Resolves to a single socket address, preferring IPv4
    ///
    /// Server and client resolve the same name identically, so a listener
    /// bound to `localhost:4242` is reachable by a client dialing it.
    pub async fn resolve(&self) -> std::io::Result<SocketAddr> {
        let host = match self {
            Address::Socket(addr) => return Ok(*addr),
            Address::Host(host) => host,
        };

        let candidates: Vec<SocketAddr> = lookup_host(host.as_str()).await?.collect();
        candidates
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| candidates.first())
            .copied()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("No addresses found for {host}"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_address() {
        let addr: Address = "127.0.0.1:4242".into();
        assert!(addr.is_socket());
        assert!(addr.as_socket().is_some());
    }

    #[test]
    fn test_host_address() {
        let addr: Address = "localhost:4242".into();
        assert!(!addr.is_socket());
        assert_eq!(addr, Address::Host("localhost:4242".to_string()));
    }

    #[test]
    fn test_from_str_rejects_missing_port() {
        assert!("localhost".parse::<Address>().is_err());
        assert!("localhost:notaport".parse::<Address>().is_err());
        assert!("localhost:4242".parse::<Address>().is_ok());
        assert!("[::1]:4242".parse::<Address>().unwrap().is_socket());
    }

    #[test]
    fn test_display() {
        let sock_addr: Address = "127.0.0.1:4242".into();
        let host_addr: Address = "localhost:4242".into();

        assert_eq!(sock_addr.to_string(), "127.0.0.1:4242");
        assert_eq!(host_addr.to_string(), "localhost:4242");
    }

    #[tokio::test]
    async fn test_resolve_localhost() {
        let addr: Address = "localhost:4242".into();
        let resolved = addr.resolve().await.unwrap();
        assert_eq!(resolved.port(), 4242);
        assert!(resolved.ip().is_loopback());
    }
}
