//! Deadline-ordered task scheduler polled by a fixed set of workers

use super::clock::now_unix;
use super::task::{BoxedTimingTask, TimingTask};
use crate::core::{panic_message, Error, Result};
use crate::queue::PriorityHeap;
use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Configuration for a timing scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of polling workers (0 = number of CPUs)
    pub num_workers: usize,
    /// Interval between polls of each worker, in milliseconds
    pub poll_interval_ms: u64,
    /// Thread name prefix
    pub thread_name_prefix: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            poll_interval_ms: 1000,
            thread_name_prefix: "timing-worker".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with `num_workers` workers polling every second
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

    /// Set the poll interval
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(Error::invalid_config(
                "num_workers",
                "Number of workers must be greater than 0",
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::invalid_config(
                "poll_interval_ms",
                "Poll interval must be at least 1ms",
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

/// Lifecycle of a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Constructed; tasks may be pushed but nothing runs
    Created,
    /// Workers are polling
    Running,
    /// Shut down; terminal
    ShutDown,
}

struct SchedulerState {
    phase: SchedulerPhase,
    tasks: PriorityHeap<BoxedTimingTask>,
    /// Dropped on shutdown, which disconnects every worker's receiver
    shutdown_tx: Option<Sender<()>>,
    workers: Vec<(usize, JoinHandle<()>)>,
}

struct SchedulerInner {
    config: SchedulerConfig,
    state: Mutex<SchedulerState>,
}

/// Cloneable access to a scheduler's task heap.
///
/// Handed to every [`TimingTask::run`] so tasks can schedule follow-ups,
/// and available from [`TimingScheduler::handle`] for producers on other
/// threads.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Arc<SchedulerInner>,
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("SchedulerHandle")
            .field("name", &self.inner.config.thread_name_prefix)
            .field("phase", &state.phase)
            .field("pending", &state.tasks.len())
            .finish()
    }
}

impl SchedulerHandle {
    fn name(&self) -> &str {
        &self.inner.config.thread_name_prefix
    }

    /// Schedule a task.
    ///
    /// # Errors
    ///
    /// Returns `ShutDown` once the scheduler has shut down; the task is
    /// dropped.
    pub fn push<T: TimingTask + 'static>(&self, task: T) -> Result<()> {
        self.push_boxed(Box::new(task))
    }

    /// Schedule an already boxed task
    pub fn push_boxed(&self, task: BoxedTimingTask) -> Result<()> {
        let mut state = self.inner.state.lock();
        if state.phase == SchedulerPhase::ShutDown {
            debug!(
                "scheduler '{}' is shut down, dropping task '{}'",
                self.name(),
                task.name()
            );
            return Err(Error::shut_down(self.name()));
        }
        state.tasks.push(task);
        Ok(())
    }

    /// Pop the earliest task if it is due at `now`
    pub(crate) fn pop_due(&self, now: i64) -> Option<BoxedTimingTask> {
        let mut state = self.inner.state.lock();
        if state.phase == SchedulerPhase::ShutDown {
            return None;
        }
        match state.tasks.peek() {
            Some(task) if task.run_at() <= now => state.tasks.pop(),
            _ => None,
        }
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.inner.state.lock().tasks.len()
    }

    /// Whether no task is pending
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().tasks.is_empty()
    }

    /// Due time of the earliest pending task
    pub fn next_due(&self) -> Option<i64> {
        self.inner.state.lock().tasks.peek().map(|task| task.run_at())
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SchedulerPhase {
        self.inner.state.lock().phase
    }

    /// Whether the scheduler has shut down
    pub fn is_shutdown(&self) -> bool {
        self.phase() == SchedulerPhase::ShutDown
    }

    /// Stop every worker and drop pending tasks.
    ///
    /// Waits for tasks that are currently running. Safe to call more than
    /// once and from inside a task; a worker never joins itself.
    pub fn shutdown(&self) -> Result<()> {
        let workers = {
            let mut state = self.inner.state.lock();
            state.phase = SchedulerPhase::ShutDown;
            drop(state.shutdown_tx.take());
            std::mem::take(&mut state.workers)
        };

        let current = thread::current().id();
        let mut result = Ok(());
        for (id, handle) in workers {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                let e = Error::join(id, "scheduler worker panicked");
                warn!("scheduler '{}': {}", self.name(), e);
                result = result.and(Err(e));
            }
        }

        let mut state = self.inner.state.lock();
        let dropped = state.tasks.len();
        state.tasks.clear();
        drop(state);
        if dropped > 0 {
            info!(
                "scheduler '{}' shut down, dropped {} pending tasks",
                self.name(),
                dropped
            );
        }

        result
    }
}

/// Runs [`TimingTask`]s no earlier than their due time.
///
/// Each of the configured workers wakes every poll interval and pops the
/// earliest task if its due time has passed, so a task may start up to one
/// interval late but never early. Eligible tasks start in ascending due
/// order.
///
/// Dropping the scheduler shuts it down.
///
/// # Example
///
/// ```rust
/// use rust_schedule_kit::schedule::{now_unix, ScheduledClosure, SchedulerConfig, TimingScheduler};
/// use std::time::Duration;
///
/// # fn main() -> rust_schedule_kit::Result<()> {
/// let config = SchedulerConfig::new(1).with_poll_interval(Duration::from_millis(10));
/// let scheduler = TimingScheduler::new(config, Vec::new())?;
/// scheduler.push(ScheduledClosure::new(now_unix(), |_| Ok(())))?;
///
/// scheduler.start()?;
/// scheduler.shutdown()?;
/// # Ok(())
/// # }
/// ```
pub struct TimingScheduler {
    handle: SchedulerHandle,
}

impl std::fmt::Debug for TimingScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimingScheduler")
            .field("config", &self.handle.inner.config)
            .field("handle", &self.handle)
            .finish()
    }
}

impl TimingScheduler {
    /// Create a scheduler holding `tasks`; nothing runs until [`start`](Self::start)
    pub fn new<I>(config: SchedulerConfig, tasks: I) -> Result<Self>
    where
        I: IntoIterator<Item = BoxedTimingTask>,
    {
        config.validate()?;

        Ok(Self {
            handle: SchedulerHandle {
                inner: Arc::new(SchedulerInner {
                    config,
                    state: Mutex::new(SchedulerState {
                        phase: SchedulerPhase::Created,
                        tasks: tasks.into_iter().collect(),
                        shutdown_tx: None,
                        workers: Vec::new(),
                    }),
                }),
            },
        })
    }

    /// Create an empty scheduler with `num_workers` workers polling every `poll_interval`
    pub fn with_workers(num_workers: usize, poll_interval: Duration) -> Result<Self> {
        Self::new(
            SchedulerConfig::new(num_workers).with_poll_interval(poll_interval),
            Vec::new(),
        )
    }

    /// Spawn the polling workers.
    ///
    /// # Errors
    ///
    /// - `AlreadyRunning` if started before
    /// - `ShutDown` if the scheduler has shut down
    /// - `SpawnError` if a thread cannot be created; the scheduler is then shut down
    pub fn start(&self) -> Result<()> {
        let inner = &self.handle.inner;
        let config = &inner.config;

        let mut state = inner.state.lock();
        match state.phase {
            SchedulerPhase::Running => {
                return Err(Error::already_running(
                    &config.thread_name_prefix,
                    config.num_workers,
                ))
            }
            SchedulerPhase::ShutDown => return Err(Error::shut_down(&config.thread_name_prefix)),
            SchedulerPhase::Created => {}
        }

        let (shutdown_tx, shutdown_rx) = channel::bounded(0);
        let mut workers = Vec::with_capacity(config.num_workers);
        for id in 0..config.num_workers {
            let handle = self.handle.clone();
            let shutdown = shutdown_rx.clone();
            let interval = config.poll_interval();

            let spawned = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, id))
                .spawn(move || run_worker(id, &handle, &shutdown, interval));

            match spawned {
                Ok(thread) => workers.push((id, thread)),
                Err(e) => {
                    state.phase = SchedulerPhase::ShutDown;
                    state.tasks.clear();
                    drop(state);
                    drop(shutdown_tx);
                    for (_, thread) in workers {
                        let _ = thread.join();
                    }
                    return Err(Error::spawn_with_source(
                        id,
                        "cannot spawn scheduler worker",
                        e,
                    ));
                }
            }
        }

        state.shutdown_tx = Some(shutdown_tx);
        state.workers = workers;
        state.phase = SchedulerPhase::Running;
        info!(
            "scheduler '{}' started with {} workers polling every {}ms",
            config.thread_name_prefix, config.num_workers, config.poll_interval_ms
        );
        Ok(())
    }

    /// A cloneable handle for pushing tasks from other threads
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// See [`SchedulerHandle::push`]
    pub fn push<T: TimingTask + 'static>(&self, task: T) -> Result<()> {
        self.handle.push(task)
    }

    /// See [`SchedulerHandle::shutdown`]
    pub fn shutdown(&self) -> Result<()> {
        self.handle.shutdown()
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.handle.len()
    }

    /// Whether no task is pending
    pub fn is_empty(&self) -> bool {
        self.handle.is_empty()
    }

    /// Due time of the earliest pending task
    pub fn next_due(&self) -> Option<i64> {
        self.handle.next_due()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SchedulerPhase {
        self.handle.phase()
    }

    /// Whether the scheduler has shut down
    pub fn is_shutdown(&self) -> bool {
        self.handle.is_shutdown()
    }

    /// Number of polling workers
    pub fn num_workers(&self) -> usize {
        self.handle.inner.config.num_workers
    }
}

impl Drop for TimingScheduler {
    fn drop(&mut self) {
        if self.handle.phase() != SchedulerPhase::ShutDown {
            let _ = self.handle.shutdown();
        }
    }
}

fn run_worker(id: usize, scheduler: &SchedulerHandle, shutdown: &Receiver<()>, interval: Duration) {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("timing_worker", id = id).entered();

    debug!("scheduler worker {} started", id);
    let ticker = channel::tick(interval);

    loop {
        select! {
            recv(shutdown) -> _ => break,
            recv(ticker) -> _ => {
                if let Some(task) = scheduler.pop_due(now_unix()) {
                    execute_task(id, task, scheduler);
                }
            }
        }
    }

    debug!("scheduler worker {} exiting", id);
}

fn execute_task(id: usize, mut task: BoxedTimingTask, scheduler: &SchedulerHandle) {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("timing_task", name = task.name(), run_at = task.run_at())
        .entered();

    let error = match catch_unwind(AssertUnwindSafe(|| task.run(scheduler))) {
        Ok(Ok(())) => return,
        Ok(Err(e)) => {
            warn!("scheduler worker {}: task '{}' failed: {}", id, task.name(), e);
            e
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(
                "scheduler worker {}: task '{}' panicked: {}",
                id,
                task.name(),
                message
            );
            Error::task_panicked(message)
        }
    };

    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| task.on_error(error))) {
        warn!(
            "scheduler worker {}: error handler of '{}' panicked, discarded: {}",
            id,
            task.name(),
            panic_message(payload.as_ref())
        );
    }
}
