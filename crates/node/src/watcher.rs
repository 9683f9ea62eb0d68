use std::fmt::Display;
use std::future::IntoFuture;

use futures::future::BoxFuture;
use futures::{Stream, StreamExt};
use lumos_pipeline::CoordinatorHandle;
use lumos_primitives::Header;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Coordinator(#[from] lumos_pipeline::Error),
}

/// Forwards the heads received from the node to the coordinator.
///
/// Heads that fail to decode are skipped. The watcher returns once the head stream ends.
pub struct HeadWatcher<S> {
    heads: S,
    coordinator: CoordinatorHandle,
}

impl<S, E> HeadWatcher<S>
where
    S: Stream<Item = Result<Header, E>> + Send,
    E: Display + Send,
{
    pub fn new(heads: S, coordinator: CoordinatorHandle) -> Self {
        Self { heads, coordinator }
    }

    pub async fn run(self) -> Result<(), Error> {
        let mut heads = std::pin::pin!(self.heads);

        while let Some(head) = heads.next().await {
            match head {
                Ok(header) => {
                    debug!(target: "node", block = %header.number, "New head received.");
                    self.coordinator.new_head(header).await?;
                }
                Err(error) => {
                    warn!(target: "node", %error, "Skipping undecodable head.");
                }
            }
        }

        info!(target: "node", "Head subscription ended.");
        Ok(())
    }
}

impl<S, E> IntoFuture for HeadWatcher<S>
where
    S: Stream<Item = Result<Header, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    type Output = Result<(), Error>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            self.run().await.inspect_err(|error| {
                error!(target: "node", %error, "Head watcher failed.");
            })
        })
    }
}

impl<S> std::fmt::Debug for HeadWatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadWatcher").field("coordinator", &self.coordinator).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;
    use lumos_confidence::ConfidenceStore;
    use lumos_pipeline::Coordinator;
    use lumos_sampling::SamplingPolicy;
    use lumos_stage::test_utils::{header, MockChain};
    use lumos_stage::BlockVerifier;

    use super::*;

    #[tokio::test]
    async fn forwards_heads_until_stream_ends() {
        let chain = MockChain::with_blocks(3, 2, 2);
        let store = ConfidenceStore::default();
        let verifier = BlockVerifier::new(chain, store.clone(), SamplingPolicy::new(2));
        let (coordinator, handle) = Coordinator::new(verifier, 10);
        let coordinator = tokio::spawn(coordinator.run());

        let heads = stream::iter([
            Ok(header(1, 2, 2)),
            Err("garbage"),
            Ok(header(2, 2, 2)),
            Ok(header(3, 2, 2)),
        ]);

        HeadWatcher::new(heads, handle).run().await.unwrap();
        coordinator.await.unwrap().unwrap();

        assert_eq!(store.latest_block(), 3);
        assert_eq!(store.started_block(), Some(1));
        assert!(store.is_verified(2));
        assert!(store.is_verified(3));
    }

    #[tokio::test]
    async fn stopped_coordinator_is_an_error() {
        let verifier = BlockVerifier::new(
            MockChain::new(),
            ConfidenceStore::default(),
            SamplingPolicy::new(2),
        );
        let (coordinator, handle) = Coordinator::new(verifier, 10);
        drop(coordinator);

        let heads = stream::iter([Ok::<_, &str>(header(1, 2, 2))]);
        let result = HeadWatcher::new(heads, handle).run().await;

        assert!(matches!(result, Err(Error::Coordinator(lumos_pipeline::Error::Closed))));
    }
}
