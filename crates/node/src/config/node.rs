use std::time::Duration;

/// WebSocket endpoint of a local node.
pub const DEFAULT_WS_URI: &str = "ws://127.0.0.1:9944";
/// Timeout of every request made to the node.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = lumos_rpc_client::DEFAULT_REQUEST_TIMEOUT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// WebSocket URL of the node.
    pub ws_uri: String,
    pub request_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self { ws_uri: DEFAULT_WS_URI.to_string(), request_timeout: DEFAULT_REQUEST_TIMEOUT }
    }
}
