use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use lumos_primitives::{BlockNumber, Cell};

#[cfg_attr(not(feature = "client"), rpc(server, namespace = "kate"))]
#[cfg_attr(feature = "client", rpc(client, server, namespace = "kate"))]
pub trait KateApi {
    /// Returns the concatenated proofs of `cells` for the given block, one segment per cell in
    /// request order.
    #[method(name = "queryProof")]
    async fn query_proof(&self, number: BlockNumber, cells: Vec<Cell>) -> RpcResult<Vec<u8>>;
}
