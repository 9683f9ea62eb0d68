use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use lumos_rpc_types::{BlockNumberArg, ConfidenceResponse, ProgressResponse};

/// Query API of the light client.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "light"))]
#[cfg_attr(feature = "client", rpc(client, server, namespace = "light"))]
pub trait LightApi {
    /// Returns the confidence that the data of the given block is available.
    ///
    /// Blocks that were observed but not yet verified are verified on the spot, so this call can
    /// take as long as one proof query round trip.
    #[method(name = "getBlockConfidence")]
    async fn get_block_confidence(&self, number: BlockNumberArg)
        -> RpcResult<ConfidenceResponse>;

    /// Returns the verification progress of the client.
    #[method(name = "getProgress")]
    async fn get_progress(&self) -> RpcResult<ProgressResponse>;
}
