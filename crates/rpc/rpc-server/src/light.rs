//! The query service: confidence lookups over the [`ConfidenceStore`].

use jsonrpsee::core::{async_trait, RpcResult};
use lumos_confidence::{serialise_confidence, ConfidenceStore};
use lumos_primitives::BlockNumber;
use lumos_rpc_api::light::LightApiServer;
use lumos_rpc_types::{BlockNumberArg, ConfidenceResponse, ProgressResponse};
use lumos_stage::{BlockVerifier, ChainClient};
use tracing::{debug, trace};

/// Confidence of a block as seen by a lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lookup {
    pub confidence: f64,
    pub verified: bool,
}

impl Lookup {
    const UNKNOWN: Self = Self { confidence: 0.0, verified: false };
}

/// Answers confidence queries, verifying observed blocks that were not verified yet.
pub struct LightApi<C> {
    verifier: BlockVerifier<C>,
}

impl<C> LightApi<C> {
    pub fn new(verifier: BlockVerifier<C>) -> Self {
        Self { verifier }
    }

    fn store(&self) -> &ConfidenceStore {
        self.verifier.store()
    }

    pub fn progress(&self) -> ProgressResponse {
        let progress = self.store().progress();
        ProgressResponse {
            verified_count: progress.verified_count,
            started_block: progress.started_block,
            latest_block: progress.latest_block,
            uptime: progress.uptime.as_secs(),
            verification_rate: progress.verification_rate(),
        }
    }
}

impl<C: ChainClient> LightApi<C> {
    /// Looks up the confidence of the block at height `number`.
    ///
    /// - Genesis has no commitment and always reports zero.
    /// - Verified blocks report their recorded confidence.
    /// - Blocks above the latest observed head report zero without touching the node.
    /// - Any other block is verified before answering.
    pub async fn lookup_confidence(&self, number: BlockNumber) -> Lookup {
        if number < 1 {
            return Lookup::UNKNOWN;
        }

        let store = self.store();
        if store.is_verified(number) {
            trace!(target: "rpc", block = %number, "Confidence served from store.");
            return Lookup { confidence: store.confidence_of(number), verified: true };
        }

        if number > store.latest_block() {
            let latest = store.latest_block();
            debug!(target: "rpc", block = %number, %latest, "Confidence requested for unseen block.");
            return Lookup::UNKNOWN;
        }

        debug!(target: "rpc", block = %number, "Verifying block on demand.");
        let outcome = self.verifier.process_block(number).await;

        Lookup { confidence: store.confidence_of(number), verified: outcome.is_verified() }
    }
}

#[async_trait]
impl<C> LightApiServer for LightApi<C>
where
    C: ChainClient + 'static,
{
    async fn get_block_confidence(&self, number: BlockNumberArg) -> RpcResult<ConfidenceResponse> {
        let number = match number.block_number() {
            Ok(number) => number,
            Err(error) => return Ok(ConfidenceResponse::error(number, error)),
        };

        let lookup = self.lookup_confidence(number).await;
        let serialised = serialise_confidence(number, lookup.confidence);

        Ok(ConfidenceResponse::new(number, lookup.confidence, serialised))
    }

    async fn get_progress(&self) -> RpcResult<ProgressResponse> {
        Ok(self.progress())
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for LightApi<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightApi").field("verifier", &self.verifier).finish()
    }
}
