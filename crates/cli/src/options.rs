//! Option groups of the node command.
//!
//! Every option can also be set through an environment variable. The command line takes
//! precedence.

use std::net::IpAddr;

use clap::Args;
use lumos_confidence::ScoringPolicy;
use lumos_node::config::metrics::{DEFAULT_METRICS_ADDR, DEFAULT_METRICS_PORT};
use lumos_node::config::node::DEFAULT_WS_URI;
use lumos_node::config::rpc::{DEFAULT_RPC_ADDR, DEFAULT_RPC_MAX_CONNECTIONS, DEFAULT_RPC_PORT};
use lumos_node::config::sampling::DEFAULT_SAMPLE_COUNT;
use lumos_node::config::sync::DEFAULT_BATCH_SIZE;
use lumos_tracing::LogFormat;

/// Default timeout of requests to the node and of query service requests, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Args, Clone, PartialEq)]
#[command(next_help_heading = "Node options")]
pub struct NodeOptions {
    /// WebSocket URL of the node to sample.
    #[arg(long = "ws-uri", value_name = "URL", env = "WSURI")]
    #[arg(default_value = DEFAULT_WS_URI)]
    pub ws_uri: String,

    /// Timeout of a single request to the node (in seconds).
    #[arg(long = "node.timeout", value_name = "TIMEOUT", env = "LUMOS_NODE_TIMEOUT")]
    #[arg(default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub request_timeout: u64,
}

impl Default for NodeOptions {
    fn default() -> Self {
        NodeOptions { ws_uri: DEFAULT_WS_URI.to_string(), request_timeout: DEFAULT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Args, Clone, PartialEq)]
#[command(next_help_heading = "Sampling options")]
pub struct SamplingOptions {
    /// Number of cells sampled per block.
    ///
    /// Capped by the number of cells in the block.
    #[arg(long = "sampling.count", value_name = "COUNT", env = "AskProofCount")]
    #[arg(default_value_t = DEFAULT_SAMPLE_COUNT)]
    pub count: usize,

    /// Also sample the transpose of every drawn cell.
    #[arg(long = "sampling.symmetric", env = "LUMOS_SAMPLING_SYMMETRIC")]
    pub symmetric: bool,

    /// How verified cells turn into a confidence.
    ///
    /// Possible values:
    /// - exponential: 1 - 2^-successes
    /// - ratio:       successes / attempts
    #[arg(long = "sampling.scoring", value_name = "POLICY", env = "LUMOS_SAMPLING_SCORING")]
    #[arg(default_value_t = ScoringPolicy::Exponential)]
    pub scoring: ScoringPolicy,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        SamplingOptions {
            count: DEFAULT_SAMPLE_COUNT,
            symmetric: false,
            scoring: ScoringPolicy::Exponential,
        }
    }
}

#[derive(Debug, Args, Clone, PartialEq)]
#[command(next_help_heading = "Sync options")]
pub struct SyncOptions {
    /// Number of blocks verified concurrently while catching up.
    #[arg(long = "sync.batch-size", value_name = "SIZE", env = "BatchSize")]
    #[arg(default_value_t = DEFAULT_BATCH_SIZE)]
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions { batch_size: DEFAULT_BATCH_SIZE }
    }
}

#[derive(Debug, Args, Clone, PartialEq)]
#[command(next_help_heading = "Server options")]
pub struct ServerOptions {
    /// Query service listening interface.
    #[arg(long = "http.addr", value_name = "ADDRESS", env = "LUMOS_HTTP_ADDR")]
    #[arg(default_value_t = DEFAULT_RPC_ADDR)]
    pub http_addr: IpAddr,

    /// Query service listening port.
    #[arg(long = "http.port", value_name = "PORT", env = "PORT")]
    #[arg(default_value_t = DEFAULT_RPC_PORT)]
    pub http_port: u16,

    /// Maximum number of concurrent connections allowed.
    #[arg(long = "rpc.max-connections", value_name = "MAX", env = "LUMOS_RPC_MAX_CONNECTIONS")]
    #[arg(default_value_t = DEFAULT_RPC_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// Timeout for a query service request (in seconds).
    #[arg(long = "rpc.timeout", value_name = "TIMEOUT", env = "LUMOS_RPC_TIMEOUT")]
    #[arg(default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,
}

impl Default for ServerOptions {
    fn default() -> Self {
        ServerOptions {
            http_addr: DEFAULT_RPC_ADDR,
            http_port: DEFAULT_RPC_PORT,
            max_connections: DEFAULT_RPC_MAX_CONNECTIONS,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Args, Clone, PartialEq)]
#[command(next_help_heading = "Metrics options")]
pub struct MetricsOptions {
    /// Serve Prometheus metrics.
    #[arg(long, env = "LUMOS_METRICS")]
    pub metrics: bool,

    /// The metrics will be served at the given address.
    #[arg(requires = "metrics")]
    #[arg(long = "metrics.addr", value_name = "ADDRESS", env = "LUMOS_METRICS_ADDR")]
    #[arg(default_value_t = DEFAULT_METRICS_ADDR)]
    pub metrics_addr: IpAddr,

    /// The metrics will be served at the given port.
    #[arg(requires = "metrics")]
    #[arg(long = "metrics.port", value_name = "PORT", env = "LUMOS_METRICS_PORT")]
    #[arg(default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        MetricsOptions {
            metrics: false,
            metrics_addr: DEFAULT_METRICS_ADDR,
            metrics_port: DEFAULT_METRICS_PORT,
        }
    }
}

#[derive(Debug, Args, Clone, Default, PartialEq)]
#[command(next_help_heading = "Logging options")]
pub struct LoggingOptions {
    /// Log output format.
    #[arg(long = "log.format", value_name = "FORMAT", env = "LUMOS_LOG_FORMAT")]
    #[arg(default_value_t = LogFormat::Full)]
    pub format: LogFormat,
}
