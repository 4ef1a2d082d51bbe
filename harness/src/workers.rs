//! Bounded worker fan-out with a join-all barrier.
//!
//! A case that needs concurrency launches K workers through
//! [`run_workers`] and blocks until every worker has finished.
//! Inter-worker ordering is unspecified; the barrier is the only
//! guarantee. Every failing worker is collected into the error, and a
//! panicking worker is reported as a failure rather than unwinding into
//! the suite.

use crate::suite::CaseError;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
    pub worker: usize,
    pub message: String,
}

impl fmt::Display for WorkerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker {}: {}", self.worker, self.message)
    }
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("{failed} of {total} workers failed: {summary}")]
    WorkersFailed {
        failed: usize,
        total: usize,
        summary: String,
        failures: Vec<WorkerFailure>,
    },

    #[error("worker task could not be joined: {message}")]
    Join { message: String },
}

impl WorkerError {
    fn workers_failed(total: usize, failures: Vec<WorkerFailure>) -> Self {
        let summary = failures
            .iter()
            .map(WorkerFailure::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self::WorkersFailed {
            failed: failures.len(),
            total,
            summary,
            failures,
        }
    }
}

/// Launch `count` workers and wait for all of them.
pub async fn run_workers<F, Fut>(count: usize, work: F) -> Result<(), WorkerError>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<(), CaseError>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for index in 0..count {
        let fut = work(index);
        tasks.spawn(async move { (index, AssertUnwindSafe(fut).catch_unwind().await) });
    }

    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        // Panics are converted to failures by catch_unwind above, so a
        // join error here means the task was aborted externally.
        let (index, outcome) = match joined {
            Ok(pair) => pair,
            Err(join_error) => {
                return Err(WorkerError::Join {
                    message: join_error.to_string(),
                })
            }
        };

        match outcome {
            Ok(Ok(())) => debug!(worker = index, "worker completed"),
            Ok(Err(failure)) => {
                error!(worker = index, error = %failure, "worker failed");
                failures.push(WorkerFailure {
                    worker: index,
                    message: failure.to_string(),
                });
            }
            Err(panic) => {
                let message = panic_message(panic);
                error!(worker = index, message, "worker panicked");
                failures.push(WorkerFailure {
                    worker: index,
                    message,
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        failures.sort_by_key(|failure| failure.worker);
        Err(WorkerError::workers_failed(count, failures))
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
