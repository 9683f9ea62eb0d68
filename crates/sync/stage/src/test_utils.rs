//! In-memory [`ChainClient`] for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lumos_primitives::{
    Block, BlockHash, BlockNumber, Cell, ExtrinsicsRoot, Header, CELL_PROOF_SIZE,
    ROW_COMMITMENT_SIZE,
};
use parking_lot::Mutex;

use crate::ChainClient;

/// How [`MockChain`] answers proof queries for a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProofBehaviour {
    /// Proofs that pass the structural check.
    #[default]
    Valid,
    /// Well formed proofs that fail the structural check.
    Invalid,
    /// One byte less than expected.
    Truncated,
    /// The query fails.
    Error,
}

#[derive(Debug, thiserror::Error)]
#[error("mock chain error: {0}")]
pub struct MockError(pub String);

/// A chain of blocks held in memory, recording the calls made against it.
#[derive(Debug, Clone, Default)]
pub struct MockChain {
    inner: Arc<MockChainInner>,
}

#[derive(Debug, Default)]
struct MockChainInner {
    headers: Mutex<HashMap<BlockNumber, Header>>,
    proofs: Mutex<HashMap<BlockNumber, ProofBehaviour>>,
    delays: Mutex<HashMap<BlockNumber, Duration>>,
    unavailable: Mutex<Vec<BlockNumber>>,
    hash_requests: Mutex<HashMap<BlockNumber, usize>>,
    proof_requests: Mutex<HashMap<BlockNumber, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a chain with blocks `1..=tip`, each with a `rows` x `cols` data matrix.
    pub fn with_blocks(tip: BlockNumber, rows: u16, cols: u16) -> Self {
        let chain = Self::new();
        for number in 1..=tip {
            chain.insert_header(header(number, rows, cols));
        }
        chain
    }

    pub fn insert_header(&self, header: Header) {
        self.inner.headers.lock().insert(header.number, header);
    }

    pub fn set_proof_behaviour(&self, number: BlockNumber, behaviour: ProofBehaviour) {
        self.inner.proofs.lock().insert(number, behaviour);
    }

    /// Delays every proof query for the block.
    pub fn set_delay(&self, number: BlockNumber, delay: Duration) {
        self.inner.delays.lock().insert(number, delay);
    }

    /// Makes the block hash lookup of the block fail.
    pub fn set_unavailable(&self, number: BlockNumber) {
        self.inner.unavailable.lock().push(number);
    }

    /// Number of hash lookups made for the block, ie the number of fetch attempts.
    pub fn fetches(&self, number: BlockNumber) -> usize {
        self.inner.hash_requests.lock().get(&number).copied().unwrap_or_default()
    }

    /// Number of fetch attempts across all blocks.
    pub fn total_fetches(&self) -> usize {
        self.inner.hash_requests.lock().values().sum()
    }

    pub fn proof_queries(&self, number: BlockNumber) -> usize {
        self.inner.proof_requests.lock().get(&number).copied().unwrap_or_default()
    }

    /// Largest number of proof queries that were pending at the same time.
    pub fn max_concurrent_queries(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }
}

/// A header whose commitment covers every row of a `rows` x `cols` matrix.
pub fn header(number: BlockNumber, rows: u16, cols: u16) -> Header {
    Header {
        number,
        extrinsics_root: ExtrinsicsRoot {
            rows,
            cols,
            commitment: vec![0xab; rows as usize * ROW_COMMITMENT_SIZE],
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn hash_of(number: BlockNumber) -> BlockHash {
    let mut hash = [0u8; 32];
    hash[24..].copy_from_slice(&number.to_be_bytes());
    BlockHash(hash)
}

fn number_of(hash: &BlockHash) -> BlockNumber {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.0[24..]);
    BlockNumber::from_be_bytes(bytes)
}

impl ChainClient for MockChain {
    type Error = MockError;

    async fn block_hash(&self, number: BlockNumber) -> Result<Option<BlockHash>, Self::Error> {
        *self.inner.hash_requests.lock().entry(number).or_default() += 1;

        if self.inner.unavailable.lock().contains(&number) {
            return Err(MockError(format!("block {number} unavailable")));
        }

        Ok(self.inner.headers.lock().contains_key(&number).then(|| hash_of(number)))
    }

    async fn block(&self, hash: BlockHash) -> Result<Option<Block>, Self::Error> {
        let header = self.inner.headers.lock().get(&number_of(&hash)).cloned();
        Ok(header.map(|header| Block { header }))
    }

    async fn query_proof(
        &self,
        number: BlockNumber,
        cells: &[Cell],
    ) -> Result<Vec<u8>, Self::Error> {
        *self.inner.proof_requests.lock().entry(number).or_default() += 1;

        let in_flight = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let delay = self.inner.delays.lock().get(&number).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);

        let behaviour = self.inner.proofs.lock().get(&number).copied().unwrap_or_default();
        let len = cells.len() * CELL_PROOF_SIZE;

        match behaviour {
            ProofBehaviour::Valid => Ok(vec![1u8; len]),
            ProofBehaviour::Invalid => Ok(vec![0u8; len]),
            ProofBehaviour::Truncated => Ok(vec![1u8; len.saturating_sub(1)]),
            ProofBehaviour::Error => Err(MockError(format!("proof query for block {number} failed"))),
        }
    }
}
