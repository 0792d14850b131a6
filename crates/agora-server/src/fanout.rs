//! Best-effort side-effect queue.
//!
//! After a primary write commits, rules submit notifications, metric
//! recomputation and activity logs here instead of awaiting them.  Jobs run
//! on background tasks with bounded concurrency; a failing job is logged and
//! never reaches the request that triggered it.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify, Semaphore};
use tracing::{debug, warn};

use crate::error::ApiResult;

struct Job {
    label: &'static str,
    task: BoxFuture<'static, ApiResult<()>>,
}

#[derive(Clone)]
pub struct FanOut {
    tx: mpsc::Sender<Job>,
    pending: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl FanOut {
    /// Start the dispatcher task.  Must be called inside a tokio runtime.
    pub fn spawn(concurrency: usize, queue: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Job>(queue.max(1));
        let permits = Arc::new(Semaphore::new(concurrency.max(1)));
        let pending = Arc::new(AtomicUsize::new(0));
        let idle = Arc::new(Notify::new());

        let worker_pending = pending.clone();
        let worker_idle = idle.clone();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let Ok(permit) = permits.clone().acquire_owned().await else {
                    break;
                };
                let pending = worker_pending.clone();
                let idle = worker_idle.clone();

                tokio::spawn(async move {
                    match job.task.await {
                        Ok(()) => debug!(task = job.label, "side effect done"),
                        Err(e) => warn!(task = job.label, error = %e, "side effect failed"),
                    }
                    drop(permit);
                    finish(&pending, &idle);
                });
            }
            debug!("fan-out queue closed");
        });

        Self { tx, pending, idle }
    }

    /// Queue a side effect without waiting for it.
    pub fn submit<F>(&self, label: &'static str, task: F)
    where
        F: Future<Output = ApiResult<()>> + Send + 'static,
    {
        self.pending.fetch_add(1, Ordering::SeqCst);

        let job = Job {
            label,
            task: Box::pin(task),
        };
        if let Err(e) = self.tx.try_send(job) {
            match e {
                TrySendError::Full(_) => warn!(task = label, "fan-out queue full, dropping side effect"),
                TrySendError::Closed(_) => warn!(task = label, "fan-out queue closed, dropping side effect"),
            }
            finish(&self.pending, &self.idle);
        }
    }

    /// Number of submitted side effects that have not finished yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Resolve once every submitted side effect has finished.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

fn finish(pending: &AtomicUsize, idle: &Notify) {
    if pending.fetch_sub(1, Ordering::SeqCst) == 1 {
        idle.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::time::Duration;

    #[tokio::test]
    async fn test_jobs_run_and_failures_are_swallowed() {
        let fanout = FanOut::spawn(2, 16);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let counter = counter.clone();
            fanout.submit("count", async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        fanout.submit("fail", async { Err(ApiError::Internal("boom".into())) });

        tokio::time::timeout(Duration::from_secs(5), fanout.wait_idle())
            .await
            .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(fanout.pending(), 0);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let fanout = FanOut::spawn(1, 16);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let running = running.clone();
            let peak = peak.clone();
            fanout.submit("slow", async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            });
        }

        tokio::time::timeout(Duration::from_secs(5), fanout.wait_idle())
            .await
            .unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_when_empty() {
        let fanout = FanOut::spawn(1, 1);
        tokio::time::timeout(Duration::from_millis(100), fanout.wait_idle())
            .await
            .unwrap();
    }
}
