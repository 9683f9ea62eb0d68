use std::future::Future;

use lumos_primitives::{Block, BlockHash, BlockNumber, Cell};
use tracing::{trace, warn};

/// Access to the node, as needed to verify a block.
///
/// [`lumos_rpc_client::Client`] is the production implementation. Tests use an in-memory chain.
pub trait ChainClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the hash of the block at height `number`.
    fn block_hash(
        &self,
        number: BlockNumber,
    ) -> impl Future<Output = Result<Option<BlockHash>, Self::Error>> + Send;

    /// Returns the block with the given hash.
    fn block(
        &self,
        hash: BlockHash,
    ) -> impl Future<Output = Result<Option<Block>, Self::Error>> + Send;

    /// Returns the proofs of `cells` in the block at height `number`, concatenated in request
    /// order.
    fn query_proof(
        &self,
        number: BlockNumber,
        cells: &[Cell],
    ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send;
}

/// Resolves block numbers to blocks.
#[derive(Debug, Clone)]
pub struct BlockFetcher<C> {
    client: C,
}

impl<C> BlockFetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: ChainClient> BlockFetcher<C> {
    /// Fetches the block at height `number`.
    ///
    /// Every failure, including the node not knowing the block, is logged and reported as `None`.
    /// Callers should treat `None` as a transient failure rather than proof that the block does
    /// not exist.
    pub async fn fetch_block(&self, number: BlockNumber) -> Option<Block> {
        trace!(target: "stage", block = %number, "Fetching block.");

        let hash = match self.client.block_hash(number).await {
            Ok(Some(hash)) => hash,
            Ok(None) => {
                warn!(target: "stage", block = %number, "Node returned no hash for block.");
                return None;
            }
            Err(error) => {
                warn!(target: "stage", block = %number, %error, "Failed to fetch block hash.");
                return None;
            }
        };

        match self.client.block(hash).await {
            Ok(Some(block)) => Some(block),
            Ok(None) => {
                warn!(target: "stage", block = %number, %hash, "Node returned no block for hash.");
                None
            }
            Err(error) => {
                warn!(target: "stage", block = %number, %hash, %error, "Failed to fetch block.");
                None
            }
        }
    }
}

///////////////////////////////////////////////////////////////////////////////////
// Implementations
///////////////////////////////////////////////////////////////////////////////////

mod impls {
    use std::future::Future;

    use lumos_primitives::{Block, BlockHash, BlockNumber, Cell};
    use lumos_rpc_client::{Client, Error};

    use super::ChainClient;

    impl ChainClient for Client {
        type Error = Error;

        fn block_hash(
            &self,
            number: BlockNumber,
        ) -> impl Future<Output = Result<Option<BlockHash>, Self::Error>> + Send {
            Client::block_hash(self, number)
        }

        fn block(
            &self,
            hash: BlockHash,
        ) -> impl Future<Output = Result<Option<Block>, Self::Error>> + Send {
            Client::block(self, hash)
        }

        fn query_proof(
            &self,
            number: BlockNumber,
            cells: &[Cell],
        ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send {
            Client::query_proof(self, number, cells)
        }
    }
}
