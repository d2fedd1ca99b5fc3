//! Worker thread implementation

use crate::core::{panic_message, BoxedTask, Error, Result};
use crate::queue::BlockingQueue;
use log::{debug, error, warn};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Tasks whose `execute` returned `Ok`
    pub tasks_completed: AtomicU64,
    /// Tasks whose `execute` returned an error
    pub tasks_failed: AtomicU64,
    /// Tasks whose `execute` panicked
    pub tasks_panicked: AtomicU64,
    /// Failure handlers that panicked themselves
    pub handler_panics: AtomicU64,
    /// Tasks popped after the queue closed and dropped unexecuted
    pub tasks_abandoned: AtomicU64,
    /// Total time spent executing tasks (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total tasks completed
    pub fn get_tasks_completed(&self) -> u64 {
        self.tasks_completed.load(Ordering::Relaxed)
    }

    /// Get total tasks failed
    pub fn get_tasks_failed(&self) -> u64 {
        self.tasks_failed.load(Ordering::Relaxed)
    }

    /// Get total tasks panicked
    pub fn get_tasks_panicked(&self) -> u64 {
        self.tasks_panicked.load(Ordering::Relaxed)
    }

    /// Get total failure handler panics
    pub fn get_handler_panics(&self) -> u64 {
        self.handler_panics.load(Ordering::Relaxed)
    }

    /// Get total tasks abandoned at exit
    pub fn get_tasks_abandoned(&self) -> u64 {
        self.tasks_abandoned.load(Ordering::Relaxed)
    }

    /// Get average processing time per executed task in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.get_tasks_completed() + self.get_tasks_failed() + self.get_tasks_panicked();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// A worker thread draining a [`BlockingQueue`] of tasks
#[derive(Debug)]
pub struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a worker named `{prefix}-{id}` consuming `queue`.
    ///
    /// The worker exits once the queue is closed.
    pub fn spawn(id: usize, prefix: &str, queue: Arc<BlockingQueue<BoxedTask>>) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let stats_clone = Arc::clone(&stats);

        let thread = thread::Builder::new()
            .name(format!("{}-{}", prefix, id))
            .spawn(move || Self::run(id, &queue, &stats_clone))
            .map_err(|e| Error::spawn_with_source(id, "cannot spawn pool worker", e))?;

        Ok(Self {
            id,
            thread: Some(thread),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Whether this worker runs on the calling thread
    pub(crate) fn is_current_thread(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|t| t.thread().id() == thread::current().id())
    }

    /// Join the worker thread
    pub fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| Error::join(self.id, "worker panicked"))?;
        }
        Ok(())
    }

    /// Main worker loop.
    ///
    /// Pops until the queue is closed. A task popped after close is
    /// abandoned, not executed.
    fn run(id: usize, queue: &BlockingQueue<BoxedTask>, stats: &WorkerStats) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("pool_worker", id = id).entered();

        debug!("pool worker {} started", id);

        while let Some(mut task) = queue.pop() {
            if queue.is_closed() {
                debug!("pool worker {} abandoning task '{}'", id, task.name());
                stats.tasks_abandoned.fetch_add(1, Ordering::Relaxed);
                break;
            }
            Self::execute_task(id, &mut task, stats);
        }

        debug!(
            "pool worker {} exiting ({} completed, {} failed, {} panicked)",
            id,
            stats.get_tasks_completed(),
            stats.get_tasks_failed(),
            stats.get_tasks_panicked()
        );
    }

    /// Execute a single task, routing errors and panics to its failure handler
    fn execute_task(id: usize, task: &mut BoxedTask, stats: &WorkerStats) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("task", name = task.name(), priority = task.priority())
            .entered();

        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| task.execute()));
        stats
            .total_processing_time_us
            .fetch_add(start.elapsed().as_micros() as u64, Ordering::Relaxed);

        let failure = match outcome {
            Ok(Ok(())) => {
                stats.tasks_completed.fetch_add(1, Ordering::Relaxed);
                return;
            }
            Ok(Err(e)) => {
                warn!("pool worker {}: task '{}' failed: {}", id, task.name(), e);
                stats.tasks_failed.fetch_add(1, Ordering::Relaxed);
                e
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    "pool worker {}: task '{}' panicked: {}",
                    id,
                    task.name(),
                    message
                );
                stats.tasks_panicked.fetch_add(1, Ordering::Relaxed);
                Error::task_panicked(message)
            }
        };

        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| task.on_failure(failure))) {
            warn!(
                "pool worker {}: failure handler of '{}' panicked, discarded: {}",
                id,
                task.name(),
                panic_message(payload.as_ref())
            );
            stats.handler_panics.fetch_add(1, Ordering::Relaxed);
        }
    }
}
