//! Task trait executed by the worker pool

use crate::core::error::{Error, Result};
use std::fmt;

/// A unit of work executed by a [`WorkerPool`](crate::pool::WorkerPool).
///
/// Tasks are ordered by [`priority`](PoolTask::priority): lower values are
/// served first. A task that returns an error or panics from
/// [`execute`](PoolTask::execute) has [`on_failure`](PoolTask::on_failure)
/// called on the worker thread; a panic inside `on_failure` is swallowed.
pub trait PoolTask: Send {
    /// Execute the task
    ///
    /// # Errors
    ///
    /// Returns an error if the task fails; the error is handed to
    /// [`on_failure`](PoolTask::on_failure).
    fn execute(&mut self) -> Result<()>;

    /// Scheduling priority, lower runs first
    fn priority(&self) -> i64 {
        0
    }

    /// Called when `execute` returns an error or panics
    fn on_failure(&mut self, error: Error) {
        let _ = error;
    }

    /// Task name for logging
    fn name(&self) -> &str {
        "Task"
    }
}

impl fmt::Debug for dyn PoolTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolTask({}, priority={})", self.name(), self.priority())
    }
}

/// A boxed task that can be sent across threads
pub type BoxedTask = Box<dyn PoolTask>;

impl crate::queue::PriorityElement for BoxedTask {
    fn priority(&self) -> i64 {
        PoolTask::priority(self.as_ref())
    }
}

type FailureHandler = Box<dyn FnMut(Error) + Send>;

/// Helper to create a task from a closure
pub struct ClosureTask<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    closure: Option<F>,
    priority: i64,
    name: String,
    failure_handler: Option<FailureHandler>,
}

impl<F> ClosureTask<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    /// Create a new closure task with priority 0
    pub fn new(closure: F) -> Self {
        Self {
            closure: Some(closure),
            priority: 0,
            name: "ClosureTask".to_string(),
            failure_handler: None,
        }
    }

    /// Set the task priority
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Set the task name
    #[must_use]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Register a callback for failures and panics
    #[must_use]
    pub fn with_failure_handler<H>(mut self, handler: H) -> Self
    where
        H: FnMut(Error) + Send + 'static,
    {
        self.failure_handler = Some(Box::new(handler));
        self
    }
}

impl<F> PoolTask for ClosureTask<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    fn execute(&mut self) -> Result<()> {
        match self.closure.take() {
            Some(closure) => closure(),
            None => Err(Error::other(
                "ClosureTask already executed - cannot execute twice",
            )),
        }
    }

    fn priority(&self) -> i64 {
        self.priority
    }

    fn on_failure(&mut self, error: Error) {
        if let Some(handler) = self.failure_handler.as_mut() {
            handler(error);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
