#![cfg_attr(not(test), warn(unused_crate_dependencies))]

//! Verification of a single block: fetch its header, sample cells, query and check their proofs,
//! then record the outcome in the [`ConfidenceStore`](lumos_confidence::ConfidenceStore).

mod fetcher;
mod metrics;
mod verifier;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use fetcher::{BlockFetcher, ChainClient};
pub use metrics::StageMetrics;
pub use verifier::{BlockOutcome, BlockStatus, BlockVerifier, Tally};

use lumos_primitives::BlockNumber;

/// Boxed error returned by a [`ChainClient`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reasons a verification run of a block can fail.
///
/// All of them are scoped to one attempt: the block keeps its previous confidence and stays
/// eligible for another attempt.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The block hash or the block could not be retrieved.
    #[error("failed to fetch block {0}")]
    Fetch(BlockNumber),

    /// The proof query failed or its response could not be decoded.
    #[error("proof query for block {block} failed: {source}")]
    Rpc {
        block: BlockNumber,
        #[source]
        source: BoxError,
    },

    /// The proof or the commitment doesn't have the expected layout.
    #[error(transparent)]
    Verification(#[from] lumos_kate::Error),
}
