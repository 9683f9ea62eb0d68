//! Light client node CLI options and configuration.

use std::time::Duration;

use anyhow::{Context, Result};
pub use clap::Parser;
use lumos_node::config::metrics::MetricsConfig;
use lumos_node::config::node::NodeConfig;
use lumos_node::config::rpc::RpcConfig;
use lumos_node::config::sampling::SamplingConfig;
use lumos_node::config::sync::SyncConfig;
use lumos_node::config::Config;
use lumos_node::Node;
use tracing::info;

use crate::options::*;
use crate::utils;

pub(crate) const LOG_TARGET: &str = "node";

#[derive(Parser, Debug, Default, Clone, PartialEq)]
#[command(next_help_heading = "Light client options")]
pub struct NodeArgs {
    #[command(flatten)]
    pub node: NodeOptions,

    #[command(flatten)]
    pub sampling: SamplingOptions,

    #[command(flatten)]
    pub sync: SyncOptions,

    #[command(flatten)]
    pub server: ServerOptions,

    #[command(flatten)]
    pub metrics: MetricsOptions,

    #[command(flatten)]
    pub logging: LoggingOptions,
}

impl NodeArgs {
    pub async fn execute(&self) -> Result<()> {
        lumos_tracing::init(self.logging.format)?;
        self.start_node().await
    }

    async fn start_node(&self) -> Result<()> {
        let config = self.config();

        let node = Node::build(config).await.context("failed to build node")?;
        let handle = node.launch().await.context("failed to launch node")?;

        info!(target: LOG_TARGET, addr = %handle.rpc().addr(), "Light client started.");

        // Wait until an OS signal (ie SIGINT, SIGTERM) is received or the node is shutdown.
        tokio::select! {
            _ = utils::wait_shutdown_signals() => {
                // Gracefully shutdown the node before exiting
                handle.stop().await?;
            },

            res = handle.stopped() => res?,
        }

        info!(target: LOG_TARGET, "Shutting down.");

        Ok(())
    }

    pub fn config(&self) -> Config {
        Config {
            node: self.node_config(),
            sampling: self.sampling_config(),
            sync: SyncConfig { batch_size: self.sync.batch_size },
            rpc: self.rpc_config(),
            metrics: self.metrics_config(),
        }
    }

    fn node_config(&self) -> NodeConfig {
        NodeConfig {
            ws_uri: self.node.ws_uri.clone(),
            request_timeout: Duration::from_secs(self.node.request_timeout),
        }
    }

    fn sampling_config(&self) -> SamplingConfig {
        SamplingConfig {
            sample_count: self.sampling.count,
            symmetric: self.sampling.symmetric,
            scoring: self.sampling.scoring,
        }
    }

    fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            addr: self.server.http_addr,
            port: self.server.http_port,
            max_connections: self.server.max_connections,
            timeout: Duration::from_secs(self.server.timeout),
        }
    }

    fn metrics_config(&self) -> Option<MetricsConfig> {
        if self.metrics.metrics {
            Some(MetricsConfig { addr: self.metrics.metrics_addr, port: self.metrics.metrics_port })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use assert_matches::assert_matches;
    use lumos_confidence::ScoringPolicy;
    use lumos_node::config::node::DEFAULT_WS_URI;
    use lumos_node::config::sampling::DEFAULT_SAMPLE_COUNT;
    use lumos_node::config::sync::DEFAULT_BATCH_SIZE;
    use lumos_tracing::LogFormat;
    use rstest::rstest;

    use super::*;

    #[test]
    fn default_config() {
        let config = NodeArgs::parse_from(["lumos"]).config();

        assert_eq!(config.node.ws_uri, DEFAULT_WS_URI);
        assert_eq!(config.node.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.sampling.sample_count, DEFAULT_SAMPLE_COUNT);
        assert!(!config.sampling.symmetric);
        assert_eq!(config.sampling.scoring, ScoringPolicy::Exponential);
        assert_eq!(config.sync.batch_size, DEFAULT_BATCH_SIZE);
        assert!(config.metrics.is_none());
    }

    #[test]
    fn custom_config() {
        let args = NodeArgs::parse_from([
            "lumos",
            "--ws-uri",
            "ws://node.example:9944",
            "--sampling.count",
            "16",
            "--sampling.symmetric",
            "--sampling.scoring",
            "ratio",
            "--sync.batch-size",
            "4",
            "--http.addr",
            "127.0.0.1",
            "--http.port",
            "7777",
            "--rpc.timeout",
            "5",
            "--metrics",
            "--metrics.port",
            "9200",
            "--log.format",
            "json",
        ]);

        assert_eq!(args.logging.format, LogFormat::Json);

        let config = args.config();
        assert_eq!(config.node.ws_uri, "ws://node.example:9944");
        assert_eq!(config.sampling.sample_count, 16);
        assert!(config.sampling.symmetric);
        assert_eq!(config.sampling.scoring, ScoringPolicy::Ratio);
        assert_eq!(config.sync.batch_size, 4);
        assert_eq!(config.rpc.socket_addr(), "127.0.0.1:7777".parse().unwrap());
        assert_eq!(config.rpc.timeout, Duration::from_secs(5));
        assert_matches!(config.metrics, Some(metrics) => {
            assert_eq!(metrics.addr, IpAddr::V4(Ipv4Addr::LOCALHOST));
            assert_eq!(metrics.port, 9200);
        });
    }

    #[rstest]
    #[case::zero_batch(&["--sync.batch-size", "0"])]
    #[case::negative_count(&["--sampling.count", "-1"])]
    #[case::unknown_scoring(&["--sampling.scoring", "median"])]
    #[case::metrics_port_without_metrics(&["--metrics.port", "9200"])]
    #[case::bad_log_format(&["--log.format", "xml"])]
    fn invalid_args(#[case] args: &[&str]) {
        let argv = std::iter::once("lumos").chain(args.iter().copied());
        assert!(NodeArgs::try_parse_from(argv).is_err());
    }
}
