use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use jsonrpsee::core::{async_trait, RpcResult, SubscriptionResult};
use jsonrpsee::server::{PendingSubscriptionSink, Server, ServerHandle};
use jsonrpsee::RpcModule;
use lumos_node::config::node::NodeConfig;
use lumos_node::config::rpc::RpcConfig;
use lumos_node::config::sampling::SamplingConfig;
use lumos_node::config::sync::SyncConfig;
use lumos_node::config::Config;
use lumos_node::Node;
use lumos_primitives::{Block, BlockHash, BlockNumber, Cell, Header, SignedBlock, CELL_PROOF_SIZE};
use lumos_rpc_api::chain::ChainApiServer;
use lumos_rpc_api::kate::KateApiServer;
use lumos_rpc_api::light::LightApiClient;
use lumos_rpc_types::BlockNumberArg;
use lumos_stage::test_utils::{hash_of, header};
use tokio::time;

const ROWS: u16 = 4;
const COLS: u16 = 4;

/// A node at height `tip` that announces every block as a new head.
#[derive(Clone)]
struct MockNode {
    tip: BlockNumber,
}

#[async_trait]
impl ChainApiServer for MockNode {
    async fn get_block_hash(&self, number: BlockNumber) -> RpcResult<Option<BlockHash>> {
        Ok((number <= self.tip).then(|| hash_of(number)))
    }

    async fn get_block(&self, hash: BlockHash) -> RpcResult<Option<SignedBlock>> {
        let block = (0..=self.tip)
            .find(|n| hash_of(*n) == hash)
            .map(|n| SignedBlock { block: Block { header: header(n, ROWS, COLS) } });
        Ok(block)
    }

    async fn subscribe_new_heads(&self, pending: PendingSubscriptionSink) -> SubscriptionResult {
        let sink = pending.accept().await?;
        for number in 1..=self.tip {
            let head: Header = header(number, ROWS, COLS);
            sink.send(serde_json::value::to_raw_value(&head)?).await?;
        }

        sink.closed().await;
        Ok(())
    }
}

#[async_trait]
impl KateApiServer for MockNode {
    async fn query_proof(&self, _: BlockNumber, cells: Vec<Cell>) -> RpcResult<Vec<u8>> {
        Ok(vec![1u8; cells.len() * CELL_PROOF_SIZE])
    }
}

async fn start_mock_node(node: MockNode) -> (SocketAddr, ServerHandle) {
    let server = Server::builder().build("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();

    let mut module = RpcModule::new(());
    module.merge(ChainApiServer::into_rpc(node.clone())).unwrap();
    module.merge(KateApiServer::into_rpc(node)).unwrap();

    (addr, server.start(module))
}

fn config(node: SocketAddr) -> Config {
    Config {
        node: NodeConfig { ws_uri: format!("ws://{node}"), request_timeout: Duration::from_secs(5) },
        sampling: SamplingConfig { sample_count: 10, ..Default::default() },
        sync: SyncConfig { batch_size: 2 },
        rpc: RpcConfig { addr: IpAddr::V4(Ipv4Addr::LOCALHOST), port: 0, ..Default::default() },
        metrics: None,
    }
}

#[tokio::test]
async fn catches_up_and_answers_queries() {
    let (addr, _mock) = start_mock_node(MockNode { tip: 5 }).await;

    let node = Node::build(config(addr)).await.unwrap();
    let node = node.launch().await.unwrap();
    let client = node.rpc().http_client().unwrap();

    time::timeout(Duration::from_secs(10), async {
        loop {
            let progress = client.get_progress().await.unwrap();
            if progress.verified_count == 5 {
                assert_eq!(progress.started_block, Some(1));
                assert_eq!(progress.latest_block, 5);
                break;
            }
            time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("every announced block should get verified");

    let response = client.get_block_confidence(BlockNumberArg::from(3)).await.unwrap();
    assert_eq!(response.number, BlockNumberArg::Number(3));
    assert_eq!(response.confidence, 99.90234375);

    let response = client.get_block_confidence(BlockNumberArg::from(50)).await.unwrap();
    assert_eq!(response.confidence, 0.0);

    node.stop().await.unwrap();
}

#[tokio::test]
async fn lost_node_connection_stops_the_node() {
    let (addr, mock) = start_mock_node(MockNode { tip: 2 }).await;

    let node = Node::build(config(addr)).await.unwrap().launch().await.unwrap();
    mock.stop().unwrap();

    time::timeout(Duration::from_secs(10), node.stopped())
        .await
        .expect("node should stop once the connection is lost")
        .unwrap();
}

#[tokio::test]
async fn unreachable_node_fails_to_build() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let error = Node::build(config(addr)).await.unwrap_err();
    assert!(error.to_string().contains("failed to connect to node"), "{error:#}");
}
