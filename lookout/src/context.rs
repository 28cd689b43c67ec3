//! Execution contexts that notifications are delivered on.
//!
//! A [`Container`](crate::Container) delivers each notification through the
//! context it was created with: if the writer is already running inside that
//! context the observer is called directly, otherwise the call is handed to
//! [`ExecutionContext::execute`] and runs later.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use tokio::{runtime::Handle, sync::mpsc};

/// A unit of work handed to an [`ExecutionContext`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Somewhere notifications can run.
pub trait ExecutionContext: Send + Sync + 'static {
    /// Whether the calling code is currently running inside this context.
    fn is_current(&self) -> bool;

    /// Schedule `job` to run inside this context.
    ///
    /// Jobs handed to the same context must run in the order they were
    /// scheduled.
    fn execute(&self, job: Job);
}

/// The context every caller is already in.
///
/// Notifications are delivered synchronously on the thread that updates the
/// container. This is what [`Container::new`](crate::Container::new) uses.
#[derive(Clone, Copy, Debug, Default)]
pub struct Immediate;

impl ExecutionContext for Immediate {
    fn is_current(&self) -> bool {
        true
    }

    fn execute(&self, job: Job) {
        job();
    }
}

tokio::task_local! {
    static CURRENT_QUEUE: QueueId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct QueueId(u64);

impl QueueId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A FIFO queue of jobs run one at a time by a tokio task.
///
/// Jobs run inside a task-local marker identifying the queue, which is how
/// [`is_current`][ExecutionContext::is_current] knows whether the caller is one
/// of this queue's jobs. The worker task exits once the queue is dropped and
/// all jobs scheduled before that have run.
pub struct SerialQueue {
    id: QueueId,
    sender: mpsc::UnboundedSender<Job>,
}

impl SerialQueue {
    /// Create a queue whose worker task is spawned on the given runtime.
    pub fn new(handle: &Handle) -> Self {
        let id = QueueId::next();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

        handle.spawn(async move {
            while let Some(job) = receiver.recv().await {
                CURRENT_QUEUE.sync_scope(id, job);
            }
        });

        Self { id, sender }
    }

    /// Create a queue whose worker task is spawned on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn spawn() -> Self {
        Self::new(&Handle::current())
    }

    /// Schedule a closure on this queue.
    ///
    /// Shorthand for `queue.execute(Box::new(f))`.
    pub fn run(&self, f: impl FnOnce() + Send + 'static) {
        self.execute(Box::new(f));
    }
}

impl ExecutionContext for SerialQueue {
    fn is_current(&self) -> bool {
        CURRENT_QUEUE.try_with(|current| *current == self.id).unwrap_or(false)
    }

    fn execute(&self, job: Job) {
        if self.sender.send(job).is_err() {
            #[cfg(feature = "tracing")]
            tracing::warn!(queue = self.id.0, "Serial queue worker has shut down, dropping job");
        }
    }
}

impl fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialQueue").field("id", &self.id.0).finish_non_exhaustive()
    }
}
