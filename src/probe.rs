//! Connectivity probe

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Reports whether the network path to the delivery server is available.
///
/// Pure query: no retries, no side effects. Safe to call from the
/// background tick task.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_connected(&self) -> bool;
}

/// Probe that attempts a short TCP connect to the endpoint host
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl std::fmt::Debug for TcpProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpProbe")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl TcpProbe {
    /// Build a probe targeting the host and port of the given base URL
    pub fn from_endpoint(endpoint: &str) -> crate::Result<Self> {
        let url = reqwest::Url::parse(endpoint)
            .map_err(|e| crate::AlerterError::Config(format!("Invalid endpoint URL: {}", e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| {
                crate::AlerterError::Config(format!("Endpoint has no host: {}", endpoint))
            })?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(80);
        Ok(Self {
            host,
            port,
            timeout: PROBE_TIMEOUT,
        })
    }
}

#[async_trait]
impl ConnectivityProbe for TcpProbe {
    async fn is_connected(&self) -> bool {
        let addr = (self.host.as_str(), self.port);
        match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!("Probe connect to {}:{} failed: {}", self.host, self.port, e);
                false
            }
            Err(_) => {
                tracing::debug!("Probe connect to {}:{} timed out", self.host, self.port);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_endpoint_parses_host_and_port() {
        let probe = TcpProbe::from_endpoint("http://192.168.1.100:5000").unwrap();
        assert_eq!(probe.host, "192.168.1.100");
        assert_eq!(probe.port, 5000);
    }

    #[test]
    fn from_endpoint_defaults_port() {
        let probe = TcpProbe::from_endpoint("http://example.com").unwrap();
        assert_eq!(probe.port, 80);
        let probe = TcpProbe::from_endpoint("https://example.com").unwrap();
        assert_eq!(probe.port, 443);
    }

    #[test]
    fn from_endpoint_rejects_garbage() {
        assert!(TcpProbe::from_endpoint("not a url").is_err());
    }

    #[tokio::test]
    async fn is_connected_false_on_refused_port() {
        // Port 1 is reserved and unbound, connect fails immediately
        let probe = TcpProbe::from_endpoint("http://127.0.0.1:1").unwrap();
        assert!(!probe.is_connected().await);
    }
}
