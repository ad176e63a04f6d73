//! Bounded-concurrency FIFO processing queue.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};
use crate::job::{JobHandle, ProcessingJob};
use crate::metrics::{self, Outcome};

/// Concurrency bound used when none is configured: strictly serial.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Queue name, used in logs and metric labels
    pub name: String,
    /// Maximum number of jobs running at the same time
    pub concurrency: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl QueueConfig {
    pub fn new(name: impl Into<String>, concurrency: usize) -> Self {
        Self {
            name: name.into(),
            concurrency,
        }
    }

    /// Create config for `name`, reading `QUEUE_<NAME>_CONCURRENCY`.
    pub fn from_env(name: &str) -> Self {
        let var = format!("QUEUE_{}_CONCURRENCY", name.to_uppercase());
        Self {
            name: name.to_string(),
            concurrency: std::env::var(var)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CONCURRENCY),
        }
    }
}

/// Point-in-time snapshot of a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub running: usize,
    pub completed: u64,
    pub failed: u64,
    pub concurrency: usize,
}

struct Pending<T> {
    job: ProcessingJob<T>,
    done: oneshot::Sender<QueueResult<T>>,
    queued_at: Instant,
}

struct State<T> {
    pending: VecDeque<Pending<T>>,
    running: usize,
    completed: u64,
    failed: u64,
}

struct Inner<T> {
    name: String,
    concurrency: usize,
    state: Mutex<State<T>>,
}

/// In-memory job queue that runs at most `concurrency` jobs at once.
///
/// Jobs start in submission order. Each submission gets a [`JobHandle`] that
/// settles with that job's own result; a failing or panicking job never
/// stops the queue. There is no retry and no persistence.
///
/// Cloning is cheap and yields a handle to the same queue.
pub struct ProcessingQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ProcessingQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> ProcessingQueue<T> {
    /// Create a queue. Fails if the concurrency bound is zero.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        if config.concurrency == 0 {
            return Err(QueueError::InvalidConcurrency(config.concurrency));
        }
        Ok(Self::with_bound(config.name, config.concurrency))
    }

    /// Create a strictly serial queue.
    pub fn serial(name: impl Into<String>) -> Self {
        Self::with_bound(name.into(), DEFAULT_CONCURRENCY)
    }

    fn with_bound(name: String, concurrency: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                concurrency,
                state: Mutex::new(State {
                    pending: VecDeque::new(),
                    running: 0,
                    completed: 0,
                    failed: 0,
                }),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn concurrency(&self) -> usize {
        self.inner.concurrency
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.lock();
        QueueStats {
            pending: state.pending.len(),
            running: state.running,
            completed: state.completed,
            failed: state.failed,
            concurrency: self.inner.concurrency,
        }
    }

    /// Append a job and start it right away if a slot is free.
    ///
    /// Returns immediately. Must be called from within a Tokio runtime.
    pub fn submit(&self, job: ProcessingJob<T>) -> JobHandle<T> {
        let (done, rx) = oneshot::channel();
        let job_id = job.id().to_string();

        {
            let mut state = self.lock();
            state.pending.push_back(Pending {
                job,
                done,
                queued_at: Instant::now(),
            });
            debug!(
                queue = %self.inner.name,
                job_id = %job_id,
                pending = state.pending.len(),
                running = state.running,
                "Job admitted"
            );
        }

        self.dispatch();
        JobHandle::new(job_id, rx)
    }

    /// Promote pending jobs while running < concurrency.
    fn dispatch(&self) {
        let ready = {
            let mut state = self.lock();
            let mut ready = Vec::new();
            while state.running < self.inner.concurrency {
                let Some(next) = state.pending.pop_front() else {
                    break;
                };
                state.running += 1;
                ready.push(next);
            }
            metrics::set_depth(&self.inner.name, state.pending.len(), state.running);
            ready
        };

        for pending in ready {
            self.start(pending);
        }
    }

    fn start(&self, pending: Pending<T>) {
        let Pending {
            job,
            done,
            queued_at,
        } = pending;
        let (job_id, run) = job.into_parts();
        let queue = self.clone();

        metrics::record_wait(&self.inner.name, queued_at.elapsed().as_secs_f64());
        debug!(queue = %self.inner.name, job_id = %job_id, "Job started");

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = AssertUnwindSafe(async move { run().await })
                .catch_unwind()
                .await;

            let result = match outcome {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(source)) => Err(QueueError::JobFailed {
                    job_id: job_id.clone(),
                    source,
                }),
                Err(payload) => Err(QueueError::JobPanicked {
                    job_id: job_id.clone(),
                    message: panic_message(payload.as_ref()),
                }),
            };

            queue.finish(&job_id, &result, started.elapsed());

            // The caller may have dropped the handle; the outcome is already recorded.
            let _ = done.send(result);
        });
    }

    /// Release the slot held by a settled job and start the next one.
    fn finish(&self, job_id: &str, result: &QueueResult<T>, elapsed: Duration) {
        let outcome = match result {
            Ok(_) => Outcome::Succeeded,
            Err(QueueError::JobPanicked { .. }) => Outcome::Panicked,
            Err(_) => Outcome::Failed,
        };

        {
            let mut state = self.lock();
            state.running -= 1;
            match outcome {
                Outcome::Succeeded => state.completed += 1,
                Outcome::Failed | Outcome::Panicked => state.failed += 1,
            }
        }

        metrics::record_settled(&self.inner.name, outcome, elapsed.as_secs_f64());
        match result {
            Ok(_) => info!(
                queue = %self.inner.name,
                job_id = %job_id,
                elapsed_ms = elapsed.as_millis() as u64,
                "Job completed"
            ),
            Err(e) => warn!(
                queue = %self.inner.name,
                job_id = %job_id,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "Job failed"
            ),
        }

        self.dispatch();
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // State is never left half-updated, so a poisoned lock is still usable.
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use std::sync::Mutex as StdMutex;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_submit_resolves_with_job_value() {
        let queue = ProcessingQueue::serial("test");
        let handle = queue.submit(ProcessingJob::new("a", || async { Ok::<_, BoxError>(7) }));

        assert_eq!(handle.job_id(), "a");
        assert_eq!(handle.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_zero_concurrency_rejected() {
        let result = ProcessingQueue::<()>::new(QueueConfig::new("test", 0));
        assert!(matches!(result, Err(QueueError::InvalidConcurrency(0))));
    }

    #[tokio::test]
    async fn test_failure_settles_only_its_own_handle() {
        let queue = ProcessingQueue::serial("test");
        let ok1 = queue.submit(ProcessingJob::new("ok1", || async { Ok::<_, BoxError>(()) }));
        let bad = queue.submit(ProcessingJob::new("bad", || async {
            Err::<(), BoxError>("encoder exploded".into())
        }));
        let ok2 = queue.submit(ProcessingJob::new("ok2", || async { Ok::<_, BoxError>(()) }));

        assert_ok!(ok1.await);
        let err = assert_err!(bad.await);
        assert!(matches!(&err, QueueError::JobFailed { job_id, .. } if job_id == "bad"));
        assert!(err.to_string().contains("encoder exploded"));
        assert_ok!(ok2.await);

        let stats = queue.stats();
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.running, 0);
        assert_eq!(stats.pending, 0);
    }

    #[tokio::test]
    async fn test_panic_is_reported_as_distinct_error() {
        let queue = ProcessingQueue::serial("test");
        let boom = queue.submit(ProcessingJob::new("boom", || async {
            if true {
                panic!("resizer aborted");
            }
            Ok::<i32, BoxError>(0)
        }));
        let after = queue.submit(ProcessingJob::new("after", || async { Ok::<_, BoxError>(1) }));

        match boom.await {
            Err(QueueError::JobPanicked { job_id, message }) => {
                assert_eq!(job_id, "boom");
                assert_eq!(message, "resizer aborted");
            }
            other => panic!("expected JobPanicked, got {:?}", other.map(|_| ())),
        }
        assert_eq!(after.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_jobs_start_in_submission_order() {
        let queue = ProcessingQueue::serial("test");
        let order = Arc::new(StdMutex::new(Vec::new()));

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let order = Arc::clone(&order);
                queue.submit(ProcessingJob::new(format!("job-{i}"), move || async move {
                    order.lock().unwrap().push(i);
                    tokio::task::yield_now().await;
                    Ok::<_, BoxError>(())
                }))
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_stall_queue() {
        let queue = ProcessingQueue::serial("test");
        drop(queue.submit(ProcessingJob::new("ignored", || async { Ok::<_, BoxError>("ignored") })));
        let next = queue.submit(ProcessingJob::new("next", || async { Ok::<_, BoxError>("done") }));

        assert_eq!(next.await.unwrap(), "done");
    }

    #[test]
    fn test_config_from_env_defaults_to_serial() {
        let config = QueueConfig::from_env("nonexistent_queue_for_test");
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.name, "nonexistent_queue_for_test");
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
