use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkerError {
    #[error("worker pool is shut down")]
    Closed,
    #[error("worker task failed: {0}")]
    TaskFailed(String),
}

/// Bounded pool for stage work. Every oracle call, file operation and
/// CPU-bound parse or render goes through here so the orchestrating task only
/// ever awaits.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    max_concurrency: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

impl WorkerPool {
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Runs an IO-bound future on its own task once a slot is free.
    pub async fn run<F, T>(&self, task: F) -> Result<T, WorkerError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| WorkerError::Closed)?;

        tokio::spawn(async move {
            let _permit = permit;
            task.await
        })
        .await
        .map_err(|e| WorkerError::TaskFailed(e.to_string()))
    }

    /// Runs CPU-bound work on the blocking thread pool once a slot is free.
    pub async fn run_blocking<F, T>(&self, task: F) -> Result<T, WorkerError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| WorkerError::Closed)?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            task()
        })
        .await
        .map_err(|e| WorkerError::TaskFailed(e.to_string()))
    }
}
