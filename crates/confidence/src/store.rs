use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lumos_primitives::BlockNumber;
use parking_lot::RwLock;

use crate::ScoringPolicy;

/// Accumulated sampling outcomes of a single block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockRecord {
    /// Successful cell checks across every verification run of the block.
    pub successes: u64,
    /// Cell checks attempted across every verification run of the block.
    pub attempts: u64,
    /// Whether at least one verification run has completed for the block.
    pub verified: bool,
}

/// A snapshot of the chain progress as seen by the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub verified_count: u64,
    pub started_block: Option<BlockNumber>,
    pub latest_block: BlockNumber,
    pub uptime: Duration,
}

impl Progress {
    /// Verified blocks per second of uptime.
    pub fn verification_rate(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.verified_count as f64 / secs
        }
    }
}

/// Shared, in-memory confidence state of every block seen by the client.
///
/// Cloning the store is cheap and every clone refers to the same state. Mutations are serialized
/// under a single lock, so concurrent verification runs never lose each other's counts.
#[derive(Clone)]
pub struct ConfidenceStore {
    inner: Arc<ConfidenceStoreInner>,
}

struct ConfidenceStoreInner {
    scoring: ScoringPolicy,
    created_at: Instant,
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    records: HashMap<BlockNumber, BlockRecord>,
    verified_count: u64,
    started_block: Option<BlockNumber>,
    latest_block: BlockNumber,
}

impl ConfidenceStore {
    pub fn new(scoring: ScoringPolicy) -> Self {
        Self {
            inner: Arc::new(ConfidenceStoreInner {
                scoring,
                created_at: Instant::now(),
                state: RwLock::new(State::default()),
            }),
        }
    }

    pub fn scoring(&self) -> ScoringPolicy {
        self.inner.scoring
    }

    /// Adds the outcome of a verification run to the block's record, creating it if needed.
    pub fn record_outcomes(&self, block: BlockNumber, successes: u64, attempts: u64) {
        let mut state = self.inner.state.write();
        let record = state.records.entry(block).or_default();
        record.successes = record.successes.saturating_add(successes);
        record.attempts = record.attempts.saturating_add(attempts.max(successes));
    }

    /// Flags the block as verified. Counts are left untouched.
    pub fn mark_verified(&self, block: BlockNumber) {
        let mut state = self.inner.state.write();
        let record = state.records.entry(block).or_default();
        if !record.verified {
            record.verified = true;
            state.verified_count += 1;
        }
    }

    pub fn is_verified(&self, block: BlockNumber) -> bool {
        self.inner.state.read().records.get(&block).is_some_and(|r| r.verified)
    }

    /// Confidence of the block in percent, or `0` if nothing was recorded for it.
    pub fn confidence_of(&self, block: BlockNumber) -> f64 {
        self.record(block).map_or(0.0, |r| self.inner.scoring.score(r.successes, r.attempts))
    }

    pub fn record(&self, block: BlockNumber) -> Option<BlockRecord> {
        self.inner.state.read().records.get(&block).copied()
    }

    /// Records a newly observed chain head.
    ///
    /// The latest block never moves backwards. The first call also sets the started block.
    pub fn advance_latest(&self, block: BlockNumber) {
        let mut state = self.inner.state.write();
        state.started_block.get_or_insert(block);
        state.latest_block = state.latest_block.max(block);
    }

    /// Highest block number observed so far, `0` before any head was observed.
    pub fn latest_block(&self) -> BlockNumber {
        self.inner.state.read().latest_block
    }

    pub fn started_block(&self) -> Option<BlockNumber> {
        self.inner.state.read().started_block
    }

    pub fn progress(&self) -> Progress {
        let state = self.inner.state.read();
        Progress {
            verified_count: state.verified_count,
            started_block: state.started_block,
            latest_block: state.latest_block,
            uptime: self.inner.created_at.elapsed(),
        }
    }
}

impl Default for ConfidenceStore {
    fn default() -> Self {
        Self::new(ScoringPolicy::default())
    }
}

impl std::fmt::Debug for ConfidenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("ConfidenceStore")
            .field("scoring", &self.inner.scoring)
            .field("blocks", &state.records.len())
            .field("latest_block", &state.latest_block)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn missing_block_has_zero_confidence() {
        let store = ConfidenceStore::default();
        assert_eq!(store.confidence_of(1), 0.0);
        assert!(!store.is_verified(1));
        assert_eq!(store.record(1), None);
    }

    #[test]
    fn recorded_outcomes_accumulate() {
        let store = ConfidenceStore::default();

        store.record_outcomes(5, 1, 2);
        assert_eq!(store.confidence_of(5), 50.0);

        store.record_outcomes(5, 9, 10);
        assert_eq!(store.confidence_of(5), 99.90234375);
        assert_eq!(store.record(5), Some(BlockRecord { successes: 10, attempts: 12, verified: false }));
    }

    #[test]
    fn confidence_never_decreases() {
        let store = ConfidenceStore::default();
        let mut previous = store.confidence_of(3);

        for successes in [0, 2, 0, 1, 5, 0] {
            store.record_outcomes(3, successes, 5);
            let current = store.confidence_of(3);
            assert!(current >= previous, "{current} < {previous}");
            previous = current;
        }
    }

    #[test]
    fn mark_verified_is_idempotent() {
        let store = ConfidenceStore::default();
        store.record_outcomes(9, 4, 4);

        store.mark_verified(9);
        store.mark_verified(9);

        assert!(store.is_verified(9));
        assert_eq!(store.record(9).unwrap().successes, 4);
        assert_eq!(store.progress().verified_count, 1);
    }

    #[test]
    fn zero_successes_still_verified() {
        let store = ConfidenceStore::default();
        store.record_outcomes(2, 0, 10);
        store.mark_verified(2);

        assert!(store.is_verified(2));
        assert_eq!(store.confidence_of(2), 0.0);
    }

    #[test]
    fn ratio_scoring() {
        let store = ConfidenceStore::new(ScoringPolicy::Ratio);
        store.record_outcomes(1, 3, 4);
        assert_eq!(store.confidence_of(1), 75.0);
    }

    #[test]
    fn latest_block_is_monotonic() {
        let store = ConfidenceStore::default();
        assert_eq!(store.latest_block(), 0);
        assert_eq!(store.started_block(), None);

        store.advance_latest(10);
        store.advance_latest(8);
        store.advance_latest(12);

        let progress = store.progress();
        assert_eq!(progress.started_block, Some(10));
        assert_eq!(progress.latest_block, 12);
    }

    #[test]
    fn verification_rate() {
        let progress = Progress {
            verified_count: 30,
            started_block: Some(1),
            latest_block: 30,
            uptime: Duration::from_secs(10),
        };
        assert_eq!(progress.verification_rate(), 3.0);

        let idle = Progress { uptime: Duration::ZERO, ..progress };
        assert_eq!(idle.verification_rate(), 0.0);
    }

    #[test]
    fn concurrent_recording_loses_nothing() {
        let store = ConfidenceStore::default();

        let handles = (0..8)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.record_outcomes(1, 1, 2);
                        store.mark_verified(1);
                    }
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.record(1), Some(BlockRecord { successes: 800, attempts: 1600, verified: true }));
        assert_eq!(store.progress().verified_count, 1);
    }
}
