//! # Balances Sequence
//!
//! A single-writer FIFO task queue. Anything that reads account state and
//! then mutates it (second-signature enrollment, balance-affecting
//! transaction creation) runs through here, one task at a time, so no two
//! such operations ever interleave.
//!
//! ```text
//! caller ──submit──▶ mpsc ──▶ worker ──spawn+await──▶ task
//!    ▲                                                 │
//!    └──────────────── oneshot (done) ◀────────────────┘
//! ```
//!
//! `submit` resolves only when the task has *finished*, not when it has
//! been queued. There is no cancellation: once accepted, a task runs to
//! completion (or panics, which is contained and reported).
//!
//! The queue is a capability, not a global. Callers receive an
//! `Arc<dyn TaskQueue>`, and tests hand in [`InlineSequence`].

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// A unit of work. Results travel back through a channel the task owns.
pub type Task = BoxFuture<'static, ()>;

/// Errors from submitting work to a sequence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("sequence is full ({0} tasks pending)")]
    Full(usize),

    #[error("sequence worker has stopped")]
    Closed,

    #[error("sequenced task panicked")]
    TaskPanicked,
}

/// An ordered executor for mutation-sensitive work.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Queue `task` and wait until it has run to completion.
    async fn submit(&self, task: Task) -> Result<(), SequenceError>;
}

/// Run `f` on `queue` and return its output.
///
/// # Example
///
/// ```
/// use keystone_protocol::sequence::{execute, InlineSequence};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let value = execute(&InlineSequence, || async { 40 + 2 }).await.unwrap();
/// assert_eq!(value, 42);
/// # }
/// ```
pub async fn execute<Q, F, Fut, T>(queue: &Q, f: F) -> Result<T, SequenceError>
where
    Q: TaskQueue + ?Sized,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let (result_tx, result_rx) = oneshot::channel();
    queue
        .submit(Box::pin(async move {
            let _ = result_tx.send(f().await);
        }))
        .await?;
    result_rx.await.map_err(|_| SequenceError::TaskPanicked)
}

// ---------------------------------------------------------------------------
// BalancesSequence
// ---------------------------------------------------------------------------

struct Job {
    task: Task,
    done: oneshot::Sender<Result<(), SequenceError>>,
}

/// The process-wide sequence: one tokio worker draining a FIFO channel.
pub struct BalancesSequence {
    sender: mpsc::UnboundedSender<Job>,
    pending: Arc<AtomicUsize>,
    max_pending: usize,
    worker: JoinHandle<()>,
}

impl BalancesSequence {
    /// Start the worker. Must be called from inside a tokio runtime.
    ///
    /// At most `max_pending` tasks (queued plus running) are accepted at
    /// once; further submissions fail with [`SequenceError::Full`].
    pub fn spawn(max_pending: usize) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker_pending = Arc::clone(&pending);

        let worker = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                // Spawning isolates panics; awaiting keeps the order strict.
                let result = tokio::spawn(job.task).await.map_err(|e| {
                    if e.is_panic() {
                        tracing::warn!("sequenced task panicked");
                        SequenceError::TaskPanicked
                    } else {
                        SequenceError::Closed
                    }
                });
                worker_pending.fetch_sub(1, Ordering::AcqRel);
                let _ = job.done.send(result);
            }
            tracing::debug!("balances sequence worker stopped");
        });

        tracing::debug!(max_pending, "balances sequence started");
        Self {
            sender,
            pending,
            max_pending,
            worker,
        }
    }

    /// Tasks accepted but not yet finished.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Stop accepting work, let queued tasks finish, and wait for the
    /// worker to exit.
    pub async fn shutdown(self) {
        let Self { sender, worker, .. } = self;
        drop(sender);
        let _ = worker.await;
    }
}

#[async_trait]
impl TaskQueue for BalancesSequence {
    async fn submit(&self, task: Task) -> Result<(), SequenceError> {
        let previous = self.pending.fetch_add(1, Ordering::AcqRel);
        if previous >= self.max_pending {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            return Err(SequenceError::Full(self.max_pending));
        }

        let (done, done_rx) = oneshot::channel();
        if self.sender.send(Job { task, done }).is_err() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            return Err(SequenceError::Closed);
        }
        tracing::trace!(pending = previous + 1, "task queued");

        done_rx.await.map_err(|_| SequenceError::Closed)?
    }
}

// ---------------------------------------------------------------------------
// InlineSequence
// ---------------------------------------------------------------------------

/// Runs each task directly in the caller. Only for tests and tools that
/// have no concurrency to order.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineSequence;

#[async_trait]
impl TaskQueue for InlineSequence {
    async fn submit(&self, task: Task) -> Result<(), SequenceError> {
        AssertUnwindSafe(task)
            .catch_unwind()
            .await
            .map_err(|_| SequenceError::TaskPanicked)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
