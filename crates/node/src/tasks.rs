//! Spawning of the node's long running tasks.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
pub use tokio_util::sync::WaitForCancellationFuture as WaitForShutdownFuture;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, trace};

/// Tracks the tasks of a node and propagates the shutdown signal to them.
///
/// A task spawned as [critical](TaskBuilder::critical) sends the shutdown signal when it
/// finishes, whether it completed or panicked. Every task still running at that point is
/// cancelled.
///
/// Dropping the manager cancels every task that has yet to complete.
#[derive(Debug, Clone)]
pub struct TaskManager {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    handle: Handle,
    tracker: TaskTracker,
    on_cancel: CancellationToken,
}

impl TaskManager {
    pub fn new(handle: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                handle,
                tracker: TaskTracker::new(),
                on_cancel: CancellationToken::new(),
            }),
        }
    }

    /// Creates a manager on the ambient Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside the context of a Tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    pub fn task_spawner(&self) -> TaskSpawner {
        TaskSpawner { inner: Arc::clone(&self.inner) }
    }

    /// Returns a future that resolves once the shutdown signal has been sent.
    pub fn wait_for_shutdown(&self) -> WaitForShutdownFuture<'_> {
        self.inner.on_cancel.cancelled()
    }

    /// Sends the shutdown signal and waits until every task has finished.
    ///
    /// No task can be spawned on the manager after this method is called.
    pub async fn shutdown(&self) {
        self.inner.on_cancel.cancel();
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
    }

    /// Number of tasks that have not finished yet.
    pub fn running(&self) -> usize {
        self.inner.tracker.len()
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        // Clones share the inner state, only the last one cancels.
        if Arc::strong_count(&self.inner) == 1 {
            trace!(target: "node", "Task manager is dropped, cancelling all ongoing tasks.");
            self.inner.on_cancel.cancel();
        }
    }
}

/// Spawns tasks on the [`TaskManager`] it was derived from.
#[derive(Debug, Clone)]
pub struct TaskSpawner {
    inner: Arc<Inner>,
}

impl TaskSpawner {
    pub fn build_task(&self) -> TaskBuilder<'_> {
        TaskBuilder { spawner: self, name: None, critical: false }
    }
}

#[derive(Debug)]
pub struct TaskBuilder<'a> {
    spawner: &'a TaskSpawner,
    name: Option<String>,
    critical: bool,
}

impl TaskBuilder<'_> {
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Shuts the node down when the task finishes.
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn spawn<F>(self, fut: F) -> TaskHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let token = self.spawner.inner.on_cancel.clone();
        let name = self.name.unwrap_or_else(|| "unnamed".to_string());
        let critical = self.critical;

        let task = async move {
            let result = tokio::select! {
                _ = token.cancelled() => TaskResult::Cancelled,
                res = AssertUnwindSafe(fut).catch_unwind() => match res {
                    Ok(output) => TaskResult::Completed(output),
                    Err(panic) => TaskResult::Panicked(panic_message(panic)),
                },
            };

            match &result {
                TaskResult::Panicked(reason) => {
                    error!(target: "node", task = %name, %reason, "Task panicked.");
                }
                TaskResult::Completed(_) => debug!(target: "node", task = %name, "Task completed."),
                TaskResult::Cancelled => debug!(target: "node", task = %name, "Task cancelled."),
            }

            if critical && !token.is_cancelled() {
                debug!(target: "node", task = %name, "Critical task finished, shutting down.");
                token.cancel();
            }

            result
        };

        let task = self.spawner.inner.tracker.track_future(task);
        TaskHandle(self.spawner.inner.handle.spawn(task))
    }
}

/// How a task spawned on a [`TaskManager`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult<T> {
    Completed(T),
    /// The shutdown signal was received, or the task was aborted, before the task completed.
    Cancelled,
    /// The task panicked. Holds the panic message.
    Panicked(String),
}

impl<T> TaskResult<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskResult::Cancelled)
    }
}

/// Handle to a spawned task.
///
/// Dropping the handle detaches the task. It keeps running and is still tracked by its
/// [`TaskManager`].
#[derive(Debug)]
pub struct TaskHandle<T>(JoinHandle<TaskResult<T>>);

impl<T> TaskHandle<T> {
    pub fn abort(&self) {
        self.0.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = TaskResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().0).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(TaskResult::Cancelled),
            Poll::Pending => Poll::Pending,
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::future;
    use tokio::time;

    use super::*;

    #[tokio::test]
    async fn normal_task_does_not_shut_down() {
        let manager = TaskManager::current();

        let result = manager.task_spawner().build_task().spawn(future::ready(7)).await;

        assert_eq!(result, TaskResult::Completed(7));
        assert!(!manager.inner.on_cancel.is_cancelled());
    }

    #[tokio::test]
    async fn critical_task_completion_shuts_down() {
        let manager = TaskManager::current();
        let spawner = manager.task_spawner();

        let pending = spawner.build_task().spawn(future::pending::<()>());
        let critical = spawner.build_task().critical().spawn(future::ready(()));

        assert_eq!(critical.await, TaskResult::Completed(()));
        time::timeout(Duration::from_secs(1), manager.wait_for_shutdown()).await.unwrap();
        assert!(pending.await.is_cancelled());
    }

    #[tokio::test]
    async fn critical_task_panic_shuts_down() {
        let manager = TaskManager::current();

        let handle = manager
            .task_spawner()
            .build_task()
            .critical()
            .name("Panicking")
            .spawn(async { panic!("boom") });

        assert_eq!(handle.await, TaskResult::<()>::Panicked("boom".to_string()));
        time::timeout(Duration::from_secs(1), manager.wait_for_shutdown()).await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_waits_for_tasks() {
        let manager = TaskManager::current();
        let spawner = manager.task_spawner();

        for _ in 0..3 {
            spawner.build_task().spawn(async {
                loop {
                    time::sleep(Duration::from_millis(10)).await
                }
            });
        }
        assert_eq!(manager.running(), 3);

        manager.shutdown().await;
        assert_eq!(manager.running(), 0);
    }

    #[tokio::test]
    async fn dropped_handle_detaches_task() {
        let manager = TaskManager::current();
        let (tx, rx) = tokio::sync::oneshot::channel();

        drop(manager.task_spawner().build_task().spawn(async move {
            time::sleep(Duration::from_millis(50)).await;
            tx.send(()).unwrap();
        }));

        time::timeout(Duration::from_secs(1), rx).await.unwrap().unwrap();
    }
}
