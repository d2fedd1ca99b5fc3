//! Fixed-size worker pool draining a priority [`BlockingQueue`]

use crate::core::{BoxedTask, ClosureTask, Error, PoolTask, Result};
use crate::pool::worker::{Worker, WorkerStats};
use crate::queue::{BlockingQueue, PushError};
use crate::tracing::TracedTask;
use log::{info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Configuration for a worker pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of worker threads (0 = number of CPUs)
    pub num_workers: usize,
    /// Initial capacity of the task queue
    pub initial_capacity: usize,
    /// Maximum queued tasks before `push` blocks (0 = unbounded)
    pub max_queue_size: usize,
    /// Thread name prefix
    pub thread_name_prefix: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            initial_capacity: 0,
            max_queue_size: 0,
            thread_name_prefix: "pool-worker".to_string(),
        }
    }
}

impl WorkerPoolConfig {
    /// Create a new configuration with specified number of workers
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: if num_workers == 0 {
                num_cpus::get()
            } else {
                num_workers
            },
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::invalid_config("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the initial queue capacity
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set maximum queue size
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(Error::invalid_config(
                "num_workers",
                "Number of workers must be greater than 0",
            ));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(Error::invalid_config(
                "thread_name_prefix",
                "Thread name prefix must not be empty",
            ));
        }
        Ok(())
    }
}

/// Lifecycle of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Constructed; tasks may be queued but nothing runs
    Created,
    /// Workers are draining the queue
    Running,
    /// Exited; terminal
    Stopped,
}

struct Lifecycle {
    state: PoolState,
    workers: Vec<Worker>,
    /// Outlives `workers` so totals survive shutdown
    stats: Vec<Arc<WorkerStats>>,
}

/// A fixed set of worker threads executing [`PoolTask`]s in priority order.
///
/// # Shutdown
///
/// [`exit`](Self::exit) closes the queue and wakes every worker. Tasks that
/// are already running finish; tasks still queued are abandoned.
/// [`shutdown`](Self::shutdown) additionally joins the workers. The pool
/// cannot be restarted.
///
/// # Example
///
/// ```rust
/// use rust_schedule_kit::pool::{WorkerPool, WorkerPoolConfig};
///
/// # fn main() -> rust_schedule_kit::Result<()> {
/// let pool = WorkerPool::with_config(WorkerPoolConfig::new(2).with_max_queue_size(16))?;
/// pool.start()?;
///
/// pool.execute_with_priority(|| Ok(()), -1)?;
///
/// pool.shutdown()?;
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool {
    config: WorkerPoolConfig,
    queue: Arc<BlockingQueue<BoxedTask>>,
    lifecycle: Mutex<Lifecycle>,
    total_tasks_submitted: AtomicU64,
    total_tasks_abandoned: AtomicU64,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("queue_size", &self.queue.len())
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool with specified number of workers and an unbounded queue
    pub fn with_workers(num_workers: usize) -> Result<Self> {
        Self::with_config(WorkerPoolConfig::new(num_workers))
    }

    /// Create a pool with custom configuration
    pub fn with_config(config: WorkerPoolConfig) -> Result<Self> {
        config.validate()?;

        let queue = Arc::new(BlockingQueue::new(
            config.initial_capacity,
            config.max_queue_size,
        ));

        Ok(Self {
            config,
            queue,
            lifecycle: Mutex::new(Lifecycle {
                state: PoolState::Created,
                workers: Vec::new(),
                stats: Vec::new(),
            }),
            total_tasks_submitted: AtomicU64::new(0),
            total_tasks_abandoned: AtomicU64::new(0),
        })
    }

    /// Spawn the workers.
    ///
    /// # Errors
    ///
    /// - `AlreadyRunning` if started before
    /// - `ShutDown` if the pool has exited
    /// - `SpawnError` if a thread cannot be created; the pool is then stopped
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            PoolState::Running => {
                return Err(Error::already_running(
                    &self.config.thread_name_prefix,
                    self.config.num_workers,
                ))
            }
            PoolState::Stopped => return Err(Error::shut_down(&self.config.thread_name_prefix)),
            PoolState::Created => {}
        }

        let mut workers = Vec::with_capacity(self.config.num_workers);
        for id in 0..self.config.num_workers {
            match Worker::spawn(id, &self.config.thread_name_prefix, Arc::clone(&self.queue)) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    lifecycle.state = PoolState::Stopped;
                    self.queue.close();
                    drop(lifecycle);
                    for worker in workers {
                        let _ = worker.join();
                    }
                    return Err(e);
                }
            }
        }

        lifecycle.stats = workers.iter().map(Worker::stats).collect();
        lifecycle.workers = workers;
        lifecycle.state = PoolState::Running;
        info!(
            "worker pool '{}' started with {} workers",
            self.config.thread_name_prefix, self.config.num_workers
        );
        Ok(())
    }

    /// Submit a task, waiting while the queue is full.
    ///
    /// Tasks pushed before [`start`](Self::start) wait in the queue.
    ///
    /// # Errors
    ///
    /// Returns `ShutDown` once the pool has exited.
    pub fn push<T: PoolTask + 'static>(&self, task: T) -> Result<()> {
        self.queue
            .push(Box::new(task))
            .map_err(|e| self.push_error(e))?;
        self.total_tasks_submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Submit a task without waiting.
    ///
    /// # Errors
    ///
    /// - `QueueFull` if the bounded queue is at capacity
    /// - `ShutDown` once the pool has exited
    pub fn try_push<T: PoolTask + 'static>(&self, task: T) -> Result<()> {
        self.queue
            .try_push(Box::new(task))
            .map_err(|e| self.push_error(e))?;
        self.total_tasks_submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Submit a task that runs inside the caller's current tracing span
    pub fn push_traced<T: PoolTask + 'static>(&self, task: T) -> Result<()> {
        self.push(TracedTask::new(task))
    }

    /// Submit a closure with priority 0
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.push(ClosureTask::new(f))
    }

    /// Submit a closure with the given priority (lower runs first)
    pub fn execute_with_priority<F>(&self, f: F, priority: i64) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.push(ClosureTask::new(f).with_priority(priority))
    }

    fn push_error(&self, err: PushError<BoxedTask>) -> Error {
        match err {
            PushError::Closed(_) => Error::shut_down(&self.config.thread_name_prefix),
            PushError::Full(_) => Error::queue_full(self.queue.len(), self.queue.max_size()),
        }
    }

    /// Stop accepting tasks and wake every worker, without joining.
    ///
    /// Running tasks finish; queued tasks are abandoned.
    pub fn exit(&self) {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.state = PoolState::Stopped;
        self.queue.close();
    }

    /// [`exit`](Self::exit), then wait for every worker to finish.
    ///
    /// Safe to call more than once and from inside a task; a worker never
    /// joins itself.
    pub fn shutdown(&self) -> Result<()> {
        let workers = {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle.state = PoolState::Stopped;
            self.queue.close();
            std::mem::take(&mut lifecycle.workers)
        };

        let mut result = Ok(());
        for worker in workers {
            if worker.is_current_thread() {
                continue;
            }
            if let Err(e) = worker.join() {
                warn!("worker pool '{}': {}", self.config.thread_name_prefix, e);
                result = result.and(Err(e));
            }
        }

        let abandoned = self.queue.try_pop_all().len() as u64;
        if abandoned > 0 {
            self.total_tasks_abandoned
                .fetch_add(abandoned, Ordering::Relaxed);
            info!(
                "worker pool '{}' abandoned {} queued tasks",
                self.config.thread_name_prefix, abandoned
            );
        }

        result
    }

    /// Current lifecycle state
    pub fn state(&self) -> PoolState {
        self.lifecycle.lock().state
    }

    /// Check if the pool is running
    pub fn is_running(&self) -> bool {
        self.state() == PoolState::Running
    }

    /// Get the number of worker threads
    pub fn num_workers(&self) -> usize {
        self.config.num_workers
    }

    /// Number of tasks waiting in the queue
    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }

    /// Get total number of tasks accepted
    pub fn total_tasks_submitted(&self) -> u64 {
        self.total_tasks_submitted.load(Ordering::Relaxed)
    }

    /// Get total number of queued tasks discarded by exit or shutdown
    pub fn total_tasks_abandoned(&self) -> u64 {
        self.total_tasks_abandoned.load(Ordering::Relaxed)
            + self
                .get_stats()
                .iter()
                .map(|s| s.get_tasks_abandoned())
                .sum::<u64>()
    }

    /// Get statistics for all workers
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.lifecycle.lock().stats.clone()
    }

    /// Get total tasks completed across all workers
    pub fn total_tasks_completed(&self) -> u64 {
        self.get_stats().iter().map(|s| s.get_tasks_completed()).sum()
    }

    /// Get total tasks failed across all workers
    pub fn total_tasks_failed(&self) -> u64 {
        self.get_stats().iter().map(|s| s.get_tasks_failed()).sum()
    }

    /// Get total tasks panicked across all workers
    pub fn total_tasks_panicked(&self) -> u64 {
        self.get_stats().iter().map(|s| s.get_tasks_panicked()).sum()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.state() != PoolState::Created {
            if let Err(e) = self.shutdown() {
                warn!(
                    "failed to shut down worker pool '{}' during drop: {}",
                    self.config.thread_name_prefix, e
                );
            }
        }
    }
}
