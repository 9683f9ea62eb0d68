#![cfg_attr(not(test), warn(unused_crate_dependencies))]

//! Client for the node APIs used by the light client.

use std::sync::Arc;
use std::time::Duration;

use jsonrpsee::ws_client::{WsClient, WsClientBuilder};
use lumos_primitives::{Block, BlockHash, BlockNumber, Cell, Header};
use lumos_rpc_api::chain::ChainApiClient;
use lumos_rpc_api::kate::KateApiClient;
use tracing::info;

pub use jsonrpsee::core::client::Subscription;

/// The default timeout of a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] jsonrpsee::core::ClientError),
}

/// A handle to a WebSocket connection with the node.
///
/// Cloning is cheap, every clone shares the same connection.
#[derive(Debug, Clone)]
pub struct Client {
    client: Arc<WsClient>,
}

impl Client {
    pub fn new(client: WsClient) -> Self {
        Self { client: Arc::new(client) }
    }

    /// Connects to the node at `url`. Every request made through the client fails once it has
    /// been pending for longer than `request_timeout`.
    pub async fn connect(url: &str, request_timeout: Duration) -> Result<Self> {
        let client = WsClientBuilder::default().request_timeout(request_timeout).build(url).await?;
        info!(target: "rpc", %url, "Connected to node.");
        Ok(Self::new(client))
    }

    /// Returns `true` while the underlying connection is alive.
    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// Returns the hash of the block at height `number`.
    pub async fn block_hash(&self, number: BlockNumber) -> Result<Option<BlockHash>> {
        Ok(self.client.get_block_hash(number).await?)
    }

    /// Returns the block with the given hash.
    pub async fn block(&self, hash: BlockHash) -> Result<Option<Block>> {
        Ok(self.client.get_block(hash).await?.map(|signed| signed.block))
    }

    /// Requests the proofs of `cells` in the block at height `number`.
    pub async fn query_proof(&self, number: BlockNumber, cells: &[Cell]) -> Result<Vec<u8>> {
        Ok(self.client.query_proof(number, cells.to_vec()).await?)
    }

    /// Subscribes to the headers of new blocks.
    pub async fn subscribe_new_heads(&self) -> Result<Subscription<Header>> {
        Ok(self.client.subscribe_new_heads().await?)
    }
}
