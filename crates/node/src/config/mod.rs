//! Node configuration.
//!
//! Every value has a `DEFAULT_*` counterpart which the CLI uses when an option is not set.

pub mod metrics;
pub mod node;
pub mod rpc;
pub mod sampling;
pub mod sync;

use metrics::MetricsConfig;
use node::NodeConfig;
use rpc::RpcConfig;
use sampling::SamplingConfig;
use sync::SyncConfig;

/// Node configurations.
///
/// List of all possible options that can be used to configure a node.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Connection to the node that is sampled.
    pub node: NodeConfig,

    /// Per-block sampling options.
    pub sampling: SamplingConfig,

    /// Catch-up options.
    pub sync: SyncConfig,

    /// Query service options.
    pub rpc: RpcConfig,

    /// Prometheus endpoint. Disabled when `None`.
    pub metrics: Option<MetricsConfig>,
}
