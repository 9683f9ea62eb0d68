use jsonrpsee::core::{RpcResult, SubscriptionResult};
use jsonrpsee::proc_macros::rpc;
use lumos_primitives::{BlockHash, BlockNumber, Header, SignedBlock};

/// Block and header access of the node.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "chain"))]
#[cfg_attr(feature = "client", rpc(client, server, namespace = "chain"))]
pub trait ChainApi {
    /// Returns the hash of the block at the given height, or `null` if the node does not know it.
    #[method(name = "getBlockHash")]
    async fn get_block_hash(&self, number: BlockNumber) -> RpcResult<Option<BlockHash>>;

    /// Returns the block with the given hash, or `null` if the node does not know it.
    #[method(name = "getBlock")]
    async fn get_block(&self, hash: BlockHash) -> RpcResult<Option<SignedBlock>>;

    /// Streams the header of every new block, in increasing height order.
    #[subscription(
        name = "subscribeNewHeads" => "newHead",
        unsubscribe = "unsubscribeNewHeads",
        item = Header
    )]
    async fn subscribe_new_heads(&self) -> SubscriptionResult;
}
