use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub use lumos_rpc_server::{DEFAULT_RPC_MAX_CONNECTIONS, DEFAULT_RPC_PORT, DEFAULT_TIMEOUT};

/// Default query service address.
pub const DEFAULT_RPC_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Query service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConfig {
    pub addr: IpAddr,
    pub port: u16,
    pub max_connections: u32,
    pub timeout: Duration,
}

impl RpcConfig {
    /// Returns the [`SocketAddr`] for the query service.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_RPC_ADDR,
            port: DEFAULT_RPC_PORT,
            max_connections: DEFAULT_RPC_MAX_CONNECTIONS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
