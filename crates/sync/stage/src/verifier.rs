use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use lumos_confidence::ConfidenceStore;
use lumos_kate::{BatchOutcome, CellVerifier, StructuralVerifier};
use lumos_primitives::BlockNumber;
use lumos_sampling::{generate_samples, SamplingPolicy};
use tracing::{info, info_span, warn, Instrument};

use crate::fetcher::{BlockFetcher, ChainClient};
use crate::metrics::StageMetrics;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    Verified,
    Failed,
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => f.write_str("verified"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Cell check counts of one verification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub successes: u64,
    pub attempts: u64,
}

impl From<&BatchOutcome> for Tally {
    fn from(outcome: &BatchOutcome) -> Self {
        Self { successes: outcome.success_count as u64, attempts: outcome.attempts() as u64 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOutcome {
    pub block: BlockNumber,
    pub status: BlockStatus,
    /// Zero for failed runs.
    pub tally: Tally,
}

impl BlockOutcome {
    pub fn is_verified(&self) -> bool {
        self.status == BlockStatus::Verified
    }
}

/// Runs the verification of individual blocks and records their outcome.
///
/// Cloning is cheap and clones share the same store.
pub struct BlockVerifier<C> {
    fetcher: BlockFetcher<C>,
    store: ConfidenceStore,
    sampling: SamplingPolicy,
    cell_verifier: Arc<dyn CellVerifier>,
    metrics: StageMetrics,
}

impl<C> BlockVerifier<C> {
    /// Creates a verifier that checks cells with the [`StructuralVerifier`].
    pub fn new(client: C, store: ConfidenceStore, sampling: SamplingPolicy) -> Self {
        Self {
            fetcher: BlockFetcher::new(client),
            store,
            sampling,
            cell_verifier: Arc::new(StructuralVerifier),
            metrics: StageMetrics::default(),
        }
    }

    /// Replaces the cell proof check.
    pub fn with_cell_verifier<V: CellVerifier + 'static>(mut self, verifier: V) -> Self {
        self.cell_verifier = Arc::new(verifier);
        self
    }

    pub fn store(&self) -> &ConfidenceStore {
        &self.store
    }

    pub fn sampling(&self) -> &SamplingPolicy {
        &self.sampling
    }

    pub fn fetcher(&self) -> &BlockFetcher<C> {
        &self.fetcher
    }
}

impl<C: ChainClient> BlockVerifier<C> {
    /// Verifies the block at height `number` and records the outcome.
    ///
    /// Errors are logged and folded into [`BlockStatus::Failed`]. A failed run leaves the store
    /// untouched, so the block can be verified again later.
    pub async fn process_block(&self, number: BlockNumber) -> BlockOutcome {
        let started_at = Instant::now();

        let span = info_span!(target: "stage", "verify_block", block = %number);
        let result = self.verify_block(number).instrument(span).await;
        let elapsed = started_at.elapsed();

        match result {
            Ok(outcome) => {
                let tally = Tally::from(&outcome);
                self.metrics.record_verified(
                    tally.successes,
                    outcome.failure_count() as u64,
                    elapsed.as_secs_f64(),
                );

                info!(
                    target: "stage",
                    block = %number,
                    successes = %tally.successes,
                    attempts = %tally.attempts,
                    confidence = %self.store.confidence_of(number),
                    ?elapsed,
                    "Block verified."
                );

                BlockOutcome { block: number, status: BlockStatus::Verified, tally }
            }

            Err(error) => {
                self.metrics.record_failed(elapsed.as_secs_f64());
                warn!(target: "stage", block = %number, %error, ?elapsed, "Block verification failed.");
                BlockOutcome { block: number, status: BlockStatus::Failed, tally: Tally::default() }
            }
        }
    }

    /// Verifies the block at height `number`, recording the outcome only if the run completes.
    ///
    /// A run completes even when no cell passes its check. The block is then marked as verified
    /// with whatever confidence it had.
    pub async fn verify_block(&self, number: BlockNumber) -> Result<BatchOutcome, Error> {
        let block = self.fetcher.fetch_block(number).await.ok_or(Error::Fetch(number))?;
        let header = &block.header;

        let samples = generate_samples(header.rows(), header.cols(), &self.sampling);

        let proof = if samples.is_empty() {
            Vec::new()
        } else {
            self.fetcher
                .client()
                .query_proof(number, samples.cells())
                .await
                .map_err(|error| Error::Rpc { block: number, source: Box::new(error) })?
        };

        let outcome = lumos_kate::verify_batch(
            self.cell_verifier.as_ref(),
            samples.cells(),
            header.commitment(),
            &proof,
        )?;

        self.store.record_outcomes(number, outcome.success_count as u64, outcome.attempts() as u64);
        self.store.mark_verified(number);

        Ok(outcome)
    }
}

impl<C: Clone> Clone for BlockVerifier<C> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            store: self.store.clone(),
            sampling: self.sampling,
            cell_verifier: self.cell_verifier.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for BlockVerifier<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockVerifier")
            .field("fetcher", &self.fetcher)
            .field("store", &self.store)
            .field("sampling", &self.sampling)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use lumos_primitives::{Cell, ExtrinsicsRoot, Header};

    use super::*;
    use crate::test_utils::{header, MockChain, ProofBehaviour};

    fn verifier(chain: &MockChain) -> BlockVerifier<MockChain> {
        BlockVerifier::new(chain.clone(), ConfidenceStore::default(), SamplingPolicy::new(10))
    }

    #[tokio::test]
    async fn verified_block_records_outcomes() {
        let chain = MockChain::with_blocks(5, 4, 4);
        let verifier = verifier(&chain);

        let outcome = verifier.process_block(3).await;

        assert_eq!(outcome.status, BlockStatus::Verified);
        assert_eq!(outcome.tally, Tally { successes: 10, attempts: 10 });
        assert!(verifier.store().is_verified(3));
        assert_eq!(verifier.store().confidence_of(3), 99.90234375);
        assert_eq!(chain.proof_queries(3), 1);
    }

    #[tokio::test]
    async fn unknown_block_fails_without_touching_the_store() {
        let chain = MockChain::with_blocks(5, 4, 4);
        let verifier = verifier(&chain);

        let outcome = verifier.process_block(6).await;

        assert_eq!(outcome.status, BlockStatus::Failed);
        assert_eq!(verifier.store().record(6), None);
        assert_eq!(chain.proof_queries(6), 0);
        assert_matches!(verifier.verify_block(6).await, Err(Error::Fetch(6)));
    }

    #[tokio::test]
    async fn hash_lookup_error_fails() {
        let chain = MockChain::with_blocks(5, 4, 4);
        chain.set_unavailable(2);
        let verifier = verifier(&chain);

        assert_eq!(verifier.process_block(2).await.status, BlockStatus::Failed);
        assert!(!verifier.store().is_verified(2));
        assert_eq!(chain.fetches(2), 1);
    }

    #[tokio::test]
    async fn proof_query_error_is_not_verified() {
        let chain = MockChain::with_blocks(5, 4, 4);
        chain.set_proof_behaviour(4, ProofBehaviour::Error);
        let verifier = verifier(&chain);

        assert_matches!(verifier.verify_block(4).await, Err(Error::Rpc { block: 4, .. }));
        assert_eq!(verifier.process_block(4).await.status, BlockStatus::Failed);
        assert!(!verifier.store().is_verified(4));
        assert_eq!(verifier.store().record(4), None);
    }

    #[tokio::test]
    async fn truncated_proof_is_malformed() {
        let chain = MockChain::with_blocks(5, 4, 4);
        chain.set_proof_behaviour(1, ProofBehaviour::Truncated);
        let verifier = verifier(&chain);

        assert_matches!(
            verifier.verify_block(1).await,
            Err(Error::Verification(lumos_kate::Error::MalformedResponse { cells: 10, .. }))
        );
        assert!(!verifier.store().is_verified(1));
    }

    #[tokio::test]
    async fn short_commitment_is_malformed() {
        let chain = MockChain::new();
        chain.insert_header(Header {
            number: 1,
            extrinsics_root: ExtrinsicsRoot { rows: 4, cols: 4, ..Default::default() },
            ..Default::default()
        });
        let verifier = verifier(&chain);

        assert_matches!(
            verifier.verify_block(1).await,
            Err(Error::Verification(lumos_kate::Error::MalformedCommitment { len: 0, .. }))
        );
    }

    #[tokio::test]
    async fn zero_successes_still_verified() {
        let chain = MockChain::with_blocks(5, 4, 4);
        chain.set_proof_behaviour(5, ProofBehaviour::Invalid);
        let verifier = verifier(&chain);

        let outcome = verifier.process_block(5).await;

        assert_eq!(outcome.status, BlockStatus::Verified);
        assert_eq!(outcome.tally, Tally { successes: 0, attempts: 10 });
        assert!(verifier.store().is_verified(5));
        assert_eq!(verifier.store().confidence_of(5), 0.0);
    }

    #[tokio::test]
    async fn repeated_runs_accumulate() {
        let chain = MockChain::with_blocks(1, 1, 1);
        let verifier = verifier(&chain);

        verifier.process_block(1).await;
        assert_eq!(verifier.store().confidence_of(1), 50.0);

        verifier.process_block(1).await;
        assert_eq!(verifier.store().confidence_of(1), 75.0);
        assert_eq!(chain.proof_queries(1), 2);
    }

    #[tokio::test]
    async fn empty_matrix_skips_the_proof_query() {
        let chain = MockChain::new();
        chain.insert_header(header(1, 0, 0));
        let verifier = verifier(&chain);

        let outcome = verifier.process_block(1).await;

        assert_eq!(outcome.status, BlockStatus::Verified);
        assert_eq!(outcome.tally, Tally::default());
        assert_eq!(chain.proof_queries(1), 0);
    }

    #[tokio::test]
    async fn custom_cell_verifier() {
        struct FirstColumnOnly;

        impl CellVerifier for FirstColumnOnly {
            fn check_cell(&self, cell: Cell, _: &[u8], _: &[u8]) -> bool {
                cell.col == 0
            }
        }

        let chain = MockChain::with_blocks(1, 4, 2);
        let verifier = BlockVerifier::new(
            chain.clone(),
            ConfidenceStore::default(),
            SamplingPolicy::new(8),
        )
        .with_cell_verifier(FirstColumnOnly);

        let outcome = verifier.process_block(1).await;
        assert_eq!(outcome.tally, Tally { successes: 4, attempts: 8 });
    }
}
