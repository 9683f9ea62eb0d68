#![cfg_attr(not(test), warn(unused_crate_dependencies))]

//! Assembly of the light client: the node connection, the sync coordinator and the query service.

pub mod config;
pub mod exit;
pub mod tasks;
pub mod watcher;

use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::{Context, Result};
use config::Config;
use lumos_confidence::ConfidenceStore;
use lumos_pipeline::Coordinator;
use lumos_rpc_client::Client;
use lumos_rpc_server::api::light::LightApiServer;
use lumos_rpc_server::light::LightApi;
use lumos_rpc_server::{CorsLayer, RpcServer, RpcServerHandle};
use lumos_stage::BlockVerifier;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use crate::exit::NodeStoppedFuture;
use crate::tasks::TaskManager;
use crate::watcher::HeadWatcher;

/// A node instance.
///
/// The struct contains the handle to all the components of the node.
#[must_use = "Node does nothing unless launched."]
#[derive(Debug)]
pub struct Node {
    config: Arc<Config>,
    client: Client,
    verifier: BlockVerifier<Client>,
    rpc_server: RpcServer,
    task_manager: TaskManager,
}

impl Node {
    /// Build the node components from the given [`Config`].
    ///
    /// Fails if the node at [`NodeConfig::ws_uri`](config::node::NodeConfig::ws_uri) can't be
    /// reached.
    pub async fn build(config: Config) -> Result<Node> {
        if let Some(cfg) = &config.metrics {
            // The recorder must be installed before any metrics handle is registered.
            PrometheusBuilder::new()
                .with_http_listener(cfg.socket_addr())
                .install()
                .context("failed to install Prometheus exporter")?;
            info!(target: "node", addr = %cfg.socket_addr(), "Metrics server started.");
        }

        let task_manager = TaskManager::current();

        // --- connect to the node

        let url = &config.node.ws_uri;
        let client = Client::connect(url, config.node.request_timeout)
            .await
            .with_context(|| format!("failed to connect to node at {url}"))?;

        // --- build verifier

        let store = ConfidenceStore::new(config.sampling.scoring);
        let verifier = BlockVerifier::new(client.clone(), store, config.sampling.policy());

        // --- build rpc server

        let api = LightApi::new(verifier.clone());
        let rpc_server = RpcServer::new()
            .health_check(true)
            .confidence_route(true)
            .cors(CorsLayer::permissive())
            .timeout(config.rpc.timeout)
            .max_connections(config.rpc.max_connections)
            .module(api.into_rpc())?;

        Ok(Node { config: Arc::new(config), client, verifier, rpc_server, task_manager })
    }

    /// Start the node.
    ///
    /// Subscribes to new heads, then starts the coordinator and the query service. Both the
    /// coordinator and the head watcher are critical: the node shuts down when either stops.
    pub async fn launch(self) -> Result<LaunchedNode> {
        info!(
            target: "node",
            node = %self.config.node.ws_uri,
            samples = self.config.sampling.sample_count,
            batch_size = self.config.sync.batch_size,
            "Starting light client."
        );

        let heads =
            self.client.subscribe_new_heads().await.context("failed to subscribe to new heads")?;

        let batch_size = self.config.sync.batch_size;
        let (coordinator, handle) = Coordinator::new(self.verifier.clone(), batch_size);

        let spawner = self.task_manager.task_spawner();
        spawner.build_task().critical().name("Coordinator").spawn(coordinator.into_future());
        spawner
            .build_task()
            .critical()
            .name("Head watcher")
            .spawn(HeadWatcher::new(heads, handle).into_future());

        let rpc = self.rpc_server.start(self.config.rpc.socket_addr()).await?;

        Ok(LaunchedNode { node: self, rpc })
    }

    /// Returns the verifier shared by the coordinator and the query service.
    pub fn verifier(&self) -> &BlockVerifier<Client> {
        &self.verifier
    }

    /// Returns a reference to the node's JSON-RPC server.
    pub fn rpc(&self) -> &RpcServer {
        &self.rpc_server
    }

    /// Returns a reference to the node's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// A handle to the launched node.
#[derive(Debug)]
pub struct LaunchedNode {
    node: Node,
    /// Handle to the rpc server.
    rpc: RpcServerHandle,
}

impl LaunchedNode {
    /// Returns a reference to the [`Node`] handle.
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Returns a reference to the rpc server handle.
    pub fn rpc(&self) -> &RpcServerHandle {
        &self.rpc
    }

    /// Stops the node.
    ///
    /// This will instruct the node to stop and wait until every task has finished.
    pub async fn stop(self) -> Result<()> {
        self.rpc.stop()?;
        self.node.task_manager.shutdown().await;
        Ok(())
    }

    /// Returns a future which resolves only when the node has stopped.
    pub fn stopped(&self) -> NodeStoppedFuture<'_> {
        NodeStoppedFuture::new(self)
    }
}
