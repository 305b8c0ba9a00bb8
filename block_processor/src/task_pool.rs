use core::{
    future::Future,
    sync::atomic::{AtomicUsize, Ordering},
};
use std::sync::Arc;

use anyhow::Result;
use logging::warn_with_slot;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::debug;

type TaskFailure = (&'static str, anyhow::Error);

/// Runs detached background tasks.
///
/// Failures are never returned to the code that spawned the task. They are sent to an error
/// channel drained by a task that logs them.
pub struct TaskPool {
    tracker: TaskTracker,
    cancellation: CancellationToken,
    failure_tx: UnboundedSender<TaskFailure>,
    failure_count: Arc<AtomicUsize>,
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskPool {
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        let (failure_tx, mut failure_rx) = mpsc::unbounded_channel::<TaskFailure>();
        let failure_count = Arc::new(AtomicUsize::new(0));
        let logged_failures = Arc::clone(&failure_count);

        tokio::spawn(async move {
            while let Some((name, error)) = failure_rx.recv().await {
                logged_failures.fetch_add(1, Ordering::Relaxed);
                warn_with_slot!("background task {name} failed: {error:?}");
            }
        });

        Self {
            tracker: TaskTracker::new(),
            cancellation: CancellationToken::new(),
            failure_tx,
            failure_count,
        }
    }

    pub fn spawn(
        &self,
        name: &'static str,
        future: impl Future<Output = Result<()>> + Send + 'static,
    ) {
        let cancellation = self.cancellation.clone();
        let failure_tx = self.failure_tx.clone();

        self.tracker.spawn(async move {
            tokio::select! {
                biased;

                () = cancellation.cancelled() => debug!("background task {name} cancelled"),

                result = future => {
                    if let Err(error) = result {
                        // The receiver only goes away when the runtime shuts down.
                        let _ = failure_tx.send((name, error));
                    }
                }
            }
        });
    }

    /// Number of failed tasks logged so far.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Waits until every task spawned so far has finished.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancels running tasks and waits for them to stop.
    pub async fn shutdown(&self) {
        self.cancellation.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}
