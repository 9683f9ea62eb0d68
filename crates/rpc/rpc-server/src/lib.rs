//! RPC server of the light client.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use std::net::SocketAddr;
use std::time::Duration;

use jsonrpsee::core::RegisterMethodError;
use jsonrpsee::server::{Server, ServerConfig, ServerHandle};
use jsonrpsee::RpcModule;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod confidence;
pub mod health;
pub mod light;

use confidence::ConfidenceRouteLayer;
use health::HealthCheck;
pub use jsonrpsee::http_client::HttpClient;
pub use lumos_rpc_api as api;
pub use tower_http::cors::CorsLayer;

/// The default port the query service listens on.
pub const DEFAULT_RPC_PORT: u16 = 7000;
/// The default maximum number of concurrent RPC connections.
pub const DEFAULT_RPC_MAX_CONNECTIONS: u32 = 100;
/// The default timeout for an RPC request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    RegisterMethod(#[from] RegisterMethodError),

    #[error("RPC server has already been stopped")]
    AlreadyStopped,

    #[error("invalid health check proxy: {0}")]
    HealthCheck(String),

    #[error(transparent)]
    Client(#[from] jsonrpsee::core::ClientError),
}

/// The RPC server handle.
#[derive(Debug, Clone)]
pub struct RpcServerHandle {
    /// The actual address that the server is bound to.
    addr: SocketAddr,
    handle: ServerHandle,
}

impl RpcServerHandle {
    /// Tell the server to stop without waiting for the server to stop.
    pub fn stop(&self) -> Result<(), Error> {
        self.handle.stop().map_err(|_| Error::AlreadyStopped)
    }

    /// Wait until the server has stopped.
    pub async fn stopped(self) {
        self.handle.stopped().await
    }

    /// Returns the socket address the server is listening on.
    pub fn addr(&self) -> &SocketAddr {
        &self.addr
    }

    /// Returns a HTTP client associated with the server.
    pub fn http_client(&self) -> Result<HttpClient, Error> {
        use jsonrpsee::http_client::HttpClientBuilder;
        let url = format!("http://{}", self.addr);
        Ok(HttpClientBuilder::default().build(url)?)
    }
}

#[derive(Debug)]
pub struct RpcServer {
    cors: Option<CorsLayer>,
    health_check: bool,
    confidence_route: bool,

    module: RpcModule<()>,
    max_connections: u32,
    timeout: Duration,
}

impl RpcServer {
    pub fn new() -> Self {
        Self {
            cors: None,
            health_check: false,
            confidence_route: false,
            module: RpcModule::new(()),
            max_connections: DEFAULT_RPC_MAX_CONNECTIONS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the maximum number of connections allowed. Default is 100.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the timeout of a request. Default is 60 seconds.
    ///
    /// A confidence query for an unverified block runs a full verification, so this should
    /// leave room for one proof query round trip.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables health checking endpoint via HTTP `GET /health`
    pub fn health_check(mut self, enable: bool) -> Self {
        self.health_check = enable;
        self
    }

    /// Serves `GET /v1/confidence/{block}` from the `light_getBlockConfidence` method.
    pub fn confidence_route(mut self, enable: bool) -> Self {
        self.confidence_route = enable;
        self
    }

    pub fn cors(mut self, cors: CorsLayer) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Adds a new RPC module to the server.
    ///
    /// This can be chained with other calls to `module` to add multiple modules.
    pub fn module(mut self, module: impl Into<jsonrpsee::Methods>) -> Result<Self, Error> {
        self.module.merge(module)?;
        Ok(self)
    }

    pub async fn start(&self, addr: SocketAddr) -> Result<RpcServerHandle, Error> {
        let mut modules = self.module.clone();

        let health_check_proxy = if self.health_check {
            modules.merge(HealthCheck::module()?)?;
            Some(HealthCheck::proxy()?)
        } else {
            None
        };

        let http_middleware = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .option_layer(self.cors.clone())
            .option_layer(health_check_proxy)
            .option_layer(self.confidence_route.then_some(ConfidenceRouteLayer))
            .timeout(self.timeout);

        let cfg = ServerConfig::builder().max_connections(self.max_connections).build();

        let server = Server::builder()
            .set_http_middleware(http_middleware)
            .set_config(cfg)
            .build(addr)
            .await?;

        // Resolve the address from the server, `addr` may have asked for port 0.
        let actual_addr = server.local_addr()?;
        let handle = server.start(modules);

        let handle = RpcServerHandle { handle, addr: actual_addr };
        info!(target: "rpc", addr = %handle.addr, "RPC server started.");

        Ok(handle)
    }
}

impl Default for RpcServer {
    fn default() -> Self {
        Self::new()
    }
}
