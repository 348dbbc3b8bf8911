//! Server configuration.
//!
//! Defaults follow the Cemuhook conventions (UDP 26760 on all interfaces).
//! Environment variables override the defaults; builder-style setters
//! override both.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Conventional DSU port.
pub const DEFAULT_PORT: u16 = 26760;
/// Subscriptions not renewed within this window are dropped.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

const ENV_PORT: &str = "PADBRIDGE_UDP_PORT";
const ENV_BIND_ADDRESS: &str = "PADBRIDGE_BIND_ADDRESS";
const ENV_CLIENT_TIMEOUT_MS: &str = "PADBRIDGE_CLIENT_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: IpAddr,
    pub port: u16,
    /// How long a client subscription stays valid without renewal.
    pub client_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            client_timeout: DEFAULT_CLIENT_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with any `PADBRIDGE_*` environment overrides.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var(ENV_PORT)
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .filter(|&p| p > 0)
            .unwrap_or(defaults.port);

        let bind_address = std::env::var(ENV_BIND_ADDRESS)
            .ok()
            .and_then(|v| v.parse::<IpAddr>().ok())
            .unwrap_or(defaults.bind_address);

        let client_timeout = std::env::var(ENV_CLIENT_TIMEOUT_MS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.client_timeout);

        Self {
            bind_address,
            port,
            client_timeout,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_bind_address(mut self, bind_address: IpAddr) -> Self {
        self.bind_address = bind_address;
        self
    }

    pub fn with_client_timeout(mut self, client_timeout: Duration) -> Self {
        self.client_timeout = client_timeout;
        self
    }

    /// The address `DsuServer::start` binds.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}
