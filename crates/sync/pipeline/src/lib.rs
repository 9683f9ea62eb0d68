#![cfg_attr(not(test), warn(unused_crate_dependencies))]

//! Block synchronization.
//!
//! The [`Coordinator`] consumes chain heads. The first head with a non-zero height starts a
//! catch-up of every block from `1` up to that head, run in its own task. Every later head is
//! verified in a task of its own as soon as it is received, independently of the catch-up
//! progress and of other live heads.

use core::future::IntoFuture;
use core::ops::RangeInclusive;
use std::time::Instant;

use futures::future::{join_all, BoxFuture};
use lumos_primitives::{BlockNumber, Header};
use lumos_stage::{BlockVerifier, ChainClient};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::task::AbortOnDropHandle;
use tracing::{error, info, warn};

mod metrics;

pub use metrics::PipelineMetrics;

/// The result of a coordinator execution.
pub type PipelineResult<T> = Result<T, Error>;

/// The future type for [Coordinator]'s implementation of [IntoFuture].
pub type CoordinatorFut = BoxFuture<'static, PipelineResult<()>>;

/// The default capacity of the head channel between a [`CoordinatorHandle`] and its coordinator.
pub const DEFAULT_HEAD_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("coordinator is no longer receiving heads")]
    Closed,

    #[error("catch-up task failed: {0}")]
    CatchUp(#[from] JoinError),
}

/// Feeds new chain heads to a [`Coordinator`].
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Header>,
}

impl CoordinatorHandle {
    /// Sends a new head to the coordinator, waiting for room in the channel if it is full.
    pub async fn new_head(&self, header: Header) -> PipelineResult<()> {
        self.tx.send(header).await.map_err(|_| Error::Closed)
    }

    /// Returns `true` once the coordinator has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Outcome of one catch-up window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSummary {
    pub range: RangeInclusive<BlockNumber>,
    pub verified: Vec<BlockNumber>,
    pub failed: Vec<BlockNumber>,
}

impl WindowSummary {
    pub fn len(&self) -> usize {
        self.verified.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits `[1, tip]` into windows of at most `batch_size` blocks, newest window first.
///
/// A `batch_size` of zero is treated as one.
pub fn catch_up_windows(tip: BlockNumber, batch_size: u64) -> Vec<RangeInclusive<BlockNumber>> {
    let batch_size = batch_size.max(1);
    let mut windows = Vec::new();

    let mut end = tip;
    while end >= 1 {
        let start = end.saturating_sub(batch_size - 1).max(1);
        windows.push(start..=end);
        end = start - 1;
    }

    windows
}

/// Verifies every block of `[1, tip]`, one window of at most `batch_size` blocks at a time.
///
/// The blocks of a window are verified concurrently and the next window only starts once all of
/// them are done. Failed blocks are reported in the window summary and never stop the catch-up.
pub async fn catch_up<C>(
    verifier: &BlockVerifier<C>,
    tip: BlockNumber,
    batch_size: u64,
    metrics: &PipelineMetrics,
) -> Vec<WindowSummary>
where
    C: ChainClient,
{
    let windows = catch_up_windows(tip, batch_size);
    info!(target: "pipeline", %tip, windows = %windows.len(), "Starting catch-up.");
    metrics.set_catch_up_target(tip);

    let mut summaries = Vec::with_capacity(windows.len());

    for range in windows {
        let started_at = Instant::now();
        let summary = run_window(verifier, range).await;
        let elapsed = started_at.elapsed();

        metrics.record_window(&summary, elapsed.as_secs_f64());

        let (from, to) = (*summary.range.start(), *summary.range.end());
        let verified = summary.verified.len();
        if summary.failed.is_empty() {
            info!(target: "pipeline", %from, %to, %verified, ?elapsed, "Catch-up window verified.");
        } else {
            warn!(
                target: "pipeline",
                %from,
                %to,
                %verified,
                failed = ?summary.failed,
                ?elapsed,
                "Catch-up window completed with failures."
            );
        }

        summaries.push(summary);
    }

    let failed = summaries.iter().map(|s| s.failed.len()).sum::<usize>();
    info!(target: "pipeline", %tip, %failed, "Catch-up finished.");

    summaries
}

async fn run_window<C: ChainClient>(
    verifier: &BlockVerifier<C>,
    range: RangeInclusive<BlockNumber>,
) -> WindowSummary {
    let outcomes = join_all(range.clone().map(|number| verifier.process_block(number))).await;

    let (verified, failed): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(|o| o.is_verified());

    WindowSummary {
        range,
        verified: verified.into_iter().map(|o| o.block).collect(),
        failed: failed.into_iter().map(|o| o.block).collect(),
    }
}

/// Drives block verification from a stream of chain heads.
pub struct Coordinator<C> {
    verifier: BlockVerifier<C>,
    batch_size: u64,
    heads: mpsc::Receiver<Header>,
    metrics: PipelineMetrics,
}

impl<C> Coordinator<C> {
    /// Creates a coordinator verifying catch-up blocks in windows of `batch_size` blocks.
    pub fn new(verifier: BlockVerifier<C>, batch_size: u64) -> (Self, CoordinatorHandle) {
        Self::with_capacity(verifier, batch_size, DEFAULT_HEAD_CHANNEL_CAPACITY)
    }

    /// Like [`new`](Self::new), with a head channel of the given capacity.
    pub fn with_capacity(
        verifier: BlockVerifier<C>,
        batch_size: u64,
        capacity: usize,
    ) -> (Self, CoordinatorHandle) {
        let (tx, heads) = mpsc::channel(capacity.max(1));
        let coordinator = Self { verifier, batch_size, heads, metrics: PipelineMetrics::default() };
        (coordinator, CoordinatorHandle { tx })
    }

    pub fn verifier(&self) -> &BlockVerifier<C> {
        &self.verifier
    }
}

impl<C> Coordinator<C>
where
    C: ChainClient + Clone + 'static,
{
    /// Runs until every [`CoordinatorHandle`] is dropped.
    ///
    /// Live heads are verified in their own tasks, so the latest block keeps tracking the chain
    /// tip while a verification waits on the node. Once the head stream closes, pending live
    /// verifications are awaited and a catch-up still in progress is aborted.
    pub async fn run(mut self) -> PipelineResult<()> {
        let mut catch_up_task: Option<AbortOnDropHandle<Vec<WindowSummary>>> = None;
        let mut live = JoinSet::new();
        let mut first_head = true;

        loop {
            tokio::select! {
                head = self.heads.recv() => {
                    let Some(head) = head else { break };
                    let number = head.number;

                    self.verifier.store().advance_latest(number);
                    self.metrics.set_latest_block(self.verifier.store().latest_block());

                    if first_head {
                        first_head = false;

                        if number >= 1 {
                            let verifier = self.verifier.clone();
                            let batch_size = self.batch_size;
                            let metrics = self.metrics.clone();

                            let task = tokio::spawn(async move {
                                catch_up(&verifier, number, batch_size, &metrics).await
                            });
                            catch_up_task = Some(AbortOnDropHandle::new(task));
                        }

                        continue;
                    }

                    if number >= 1 {
                        info!(target: "pipeline", block = %number, "Verifying new head.");
                        let verifier = self.verifier.clone();
                        let metrics = self.metrics.clone();

                        live.spawn(async move {
                            let outcome = verifier.process_block(number).await;
                            metrics.record_live(&outcome);
                        });
                    }
                }

                Some(result) = live.join_next(), if !live.is_empty() => {
                    log_live_result(result);
                }
            }
        }

        info!(target: "pipeline", pending = %live.len(), "Head stream closed.");

        while let Some(result) = live.join_next().await {
            log_live_result(result);
        }

        if let Some(task) = catch_up_task {
            if task.is_finished() {
                task.await?;
            } else {
                warn!(target: "pipeline", "Aborting unfinished catch-up.");
            }
        }

        Ok(())
    }
}

fn log_live_result(result: Result<(), JoinError>) {
    if let Err(error) = result {
        error!(target: "pipeline", %error, "Live verification task failed.");
    }
}

impl<C> IntoFuture for Coordinator<C>
where
    C: ChainClient + Clone + 'static,
{
    type Output = PipelineResult<()>;
    type IntoFuture = CoordinatorFut;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            self.run().await.inspect_err(|error| {
                error!(target: "pipeline", %error, "Coordinator failed.");
            })
        })
    }
}

impl<C> core::fmt::Debug for Coordinator<C>
where
    C: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Coordinator")
            .field("verifier", &self.verifier)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_are_newest_first_without_gaps() {
        let windows = catch_up_windows(25, 10);
        assert_eq!(windows, vec![16..=25, 6..=15, 1..=5]);
    }

    #[test]
    fn windows_edge_cases() {
        assert!(catch_up_windows(0, 10).is_empty());
        assert_eq!(catch_up_windows(1, 10), vec![1..=1]);
        assert_eq!(catch_up_windows(10, 10), vec![1..=10]);
        assert_eq!(catch_up_windows(3, 0), vec![3..=3, 2..=2, 1..=1]);
        assert_eq!(catch_up_windows(20, 10), vec![11..=20, 1..=10]);
    }
}
