//! Tasks executed by the timing scheduler

use super::clock::today_time;
use super::timing::SchedulerHandle;
use crate::core::{Error, Result};
use std::fmt;

/// A unit of work that becomes eligible at a wall-clock time.
///
/// The scheduler never runs a task before [`run_at`](TimingTask::run_at).
/// Errors and panics from [`run`](TimingTask::run) are routed to
/// [`on_error`](TimingTask::on_error) on the worker thread.
pub trait TimingTask: Send {
    /// Unix timestamp (seconds) at which the task becomes due
    fn run_at(&self) -> i64;

    /// Run the task. `scheduler` may be used to submit follow-up tasks.
    ///
    /// # Errors
    ///
    /// Any error is handed to [`on_error`](TimingTask::on_error).
    fn run(&mut self, scheduler: &SchedulerHandle) -> Result<()>;

    /// Called when `run` returns an error or panics
    fn on_error(&mut self, error: Error) {
        let _ = error;
    }

    /// Task name for logging
    fn name(&self) -> &str {
        "TimingTask"
    }
}

impl fmt::Debug for dyn TimingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimingTask({}, run_at={})", self.name(), self.run_at())
    }
}

/// A boxed timing task
pub type BoxedTimingTask = Box<dyn TimingTask>;

impl crate::queue::PriorityElement for BoxedTimingTask {
    fn priority(&self) -> i64 {
        self.run_at()
    }
}

type ErrorHandler = Box<dyn FnMut(Error) + Send>;

/// A timing task built from a closure.
///
/// # Example
///
/// ```rust
/// use rust_schedule_kit::schedule::{now_unix, ScheduledClosure, TimingTask};
///
/// let task = ScheduledClosure::new(now_unix() + 5, |_scheduler| Ok(()))
///     .with_name("reminder");
/// assert_eq!(task.name(), "reminder");
/// ```
pub struct ScheduledClosure<F>
where
    F: FnOnce(&SchedulerHandle) -> Result<()> + Send,
{
    run_at: i64,
    closure: Option<F>,
    name: String,
    error_handler: Option<ErrorHandler>,
}

impl<F> ScheduledClosure<F>
where
    F: FnOnce(&SchedulerHandle) -> Result<()> + Send,
{
    /// Run `closure` at Unix time `run_at`
    pub fn new(run_at: i64, closure: F) -> Self {
        Self {
            run_at,
            closure: Some(closure),
            name: "ScheduledClosure".to_string(),
            error_handler: None,
        }
    }

    /// Run `closure` today at `time_of_day` (`HH:MM:SS`, local time)
    pub fn today_at(time_of_day: &str, closure: F) -> Result<Self> {
        Ok(Self::new(today_time(time_of_day)?, closure))
    }

    /// Set the task name
    #[must_use]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Register a callback for errors and panics
    #[must_use]
    pub fn with_error_handler<H>(mut self, handler: H) -> Self
    where
        H: FnMut(Error) + Send + 'static,
    {
        self.error_handler = Some(Box::new(handler));
        self
    }
}

impl<F> TimingTask for ScheduledClosure<F>
where
    F: FnOnce(&SchedulerHandle) -> Result<()> + Send,
{
    fn run_at(&self) -> i64 {
        self.run_at
    }

    fn run(&mut self, scheduler: &SchedulerHandle) -> Result<()> {
        match self.closure.take() {
            Some(closure) => closure(scheduler),
            None => Err(Error::other("ScheduledClosure already ran")),
        }
    }

    fn on_error(&mut self, error: Error) {
        if let Some(handler) = self.error_handler.as_mut() {
            handler(error);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
