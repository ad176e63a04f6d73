//! Job and completion handle types.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use tokio::sync::oneshot;

use crate::error::{BoxError, QueueError, QueueResult};

type RunFn<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, BoxError>> + Send>;

/// A unit of work plus the identity used to report its outcome.
///
/// The id only needs to be distinguishable from other jobs that are in the
/// same queue at the same time.
pub struct ProcessingJob<T> {
    id: String,
    run: RunFn<T>,
}

impl<T: Send + 'static> ProcessingJob<T> {
    /// Create a job from an async closure.
    pub fn new<F, Fut, E>(id: impl Into<String>, run: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self {
            id: id.into(),
            run: Box::new(move || Box::pin(async move { run().await.map_err(Into::into) })),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn into_parts(self) -> (String, RunFn<T>) {
        (self.id, self.run)
    }
}

impl<T> fmt::Debug for ProcessingJob<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingJob").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Settles once with the outcome of the job it was returned for.
#[must_use = "the job runs regardless, but its outcome is only observable through the handle"]
pub struct JobHandle<T> {
    job_id: String,
    rx: oneshot::Receiver<QueueResult<T>>,
}

impl<T> JobHandle<T> {
    pub(crate) fn new(job_id: String, rx: oneshot::Receiver<QueueResult<T>>) -> Self {
        Self { job_id, rx }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

impl<T> Future for JobHandle<T> {
    type Output = QueueResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(QueueError::Abandoned {
                job_id: this.job_id.clone(),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for JobHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle").field("job_id", &self.job_id).finish()
    }
}
