//! Detached remote writes.
//!
//! Local state is updated first; the matching remote call runs as a spawned
//! task tracked here so failures are logged and the process can wait for
//! outstanding writes before exiting. Writes that share a key run one after
//! another in the order they were spawned.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinSet;

/// Outcome of the writes settled since the previous flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl FlushSummary {
    fn settle(&mut self, outcome: Result<bool, tokio::task::JoinError>) {
        match outcome {
            Ok(true) => self.succeeded += 1,
            Ok(false) => self.failed += 1,
            Err(e) => {
                tracing::warn!("background write panicked: {e}");
                self.failed += 1;
            }
        }
    }
}

#[derive(Debug, Default)]
struct Tracked {
    tasks: JoinSet<bool>,
    /// Outcomes reaped before the next flush.
    settled: FlushSummary,
    /// Completion signal of the latest write per key.
    tails: HashMap<String, oneshot::Receiver<()>>,
}

impl Tracked {
    /// Reap finished tasks and forget keys with nothing in flight.
    fn reap(&mut self) {
        while let Some(done) = self.tasks.try_join_next() {
            self.settled.settle(done);
        }
        self.tails
            .retain(|_, done| matches!(done.try_recv(), Err(TryRecvError::Empty)));
    }

    fn launch<F>(&mut self, label: String, write: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.tasks.spawn(async move {
            match write.await {
                Ok(()) => {
                    tracing::debug!("remote write ok: {label}");
                    true
                }
                Err(e) => {
                    tracing::warn!("remote write failed, local state kept: {label}: {e:#}");
                    false
                }
            }
        });
    }
}

/// A set of fire-and-forget remote writes.
#[derive(Debug, Default)]
pub struct BackgroundWrites {
    tracked: Mutex<Tracked>,
}

impl BackgroundWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a remote write. A failure is logged with `label` and never
    /// surfaces to the caller.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&self, label: impl Into<String>, write: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut tracked = self.tracked.lock().unwrap_or_else(|e| e.into_inner());
        tracked.reap();
        tracked.launch(label.into(), write);
    }

    /// Spawn a remote write that starts only after every earlier write with
    /// the same `key` has finished, successfully or not.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_keyed<F>(&self, key: impl Into<String>, label: impl Into<String>, write: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let (finished, done) = oneshot::channel();
        let mut tracked = self.tracked.lock().unwrap_or_else(|e| e.into_inner());
        tracked.reap();
        let previous = tracked.tails.insert(key.into(), done);
        tracked.launch(label.into(), async move {
            if let Some(previous) = previous {
                // A dropped sender means the earlier write panicked; carry on.
                let _ = previous.await;
            }
            let outcome = write.await;
            let _ = finished.send(());
            outcome
        });
    }

    /// Number of writes not yet reaped.
    pub fn pending(&self) -> usize {
        self.tracked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .tasks
            .len()
    }

    /// Wait for every outstanding write to finish.
    pub async fn flush(&self) -> FlushSummary {
        let (mut tasks, mut summary) = {
            let mut guard = self.tracked.lock().unwrap_or_else(|e| e.into_inner());
            (
                std::mem::take(&mut guard.tasks),
                std::mem::take(&mut guard.settled),
            )
        };
        while let Some(done) = tasks.join_next().await {
            summary.settle(done);
        }
        summary
    }
}
