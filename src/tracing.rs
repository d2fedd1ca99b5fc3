//! Span propagation for pool tasks.
//!
//! With the `tracing` feature enabled, a [`TracedTask`] captures the span
//! that is current when it is created and enters it on the worker thread,
//! so events emitted by the task nest under the submitter's span. Without
//! the feature it is a transparent wrapper.
//!
//! # Example
//!
//! ```rust
//! use rust_schedule_kit::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::with_workers(2)?;
//! pool.start()?;
//! pool.push_traced(ClosureTask::new(|| Ok(())).with_name("traced"))?;
//! pool.shutdown()?;
//! # Ok(())
//! # }
//! ```

use crate::core::{Error, PoolTask, Result};

/// A [`PoolTask`] that runs inside the span current at its creation
pub struct TracedTask<T: PoolTask> {
    inner: T,
    #[cfg(feature = "tracing")]
    span: tracing::Span,
}

impl<T: PoolTask> TracedTask<T> {
    /// Wrap `task`, capturing the current span
    pub fn new(task: T) -> Self {
        Self {
            inner: task,
            #[cfg(feature = "tracing")]
            span: tracing::Span::current(),
        }
    }

    /// Wrap `task` with an explicit span
    #[cfg(feature = "tracing")]
    pub fn with_span(task: T, span: tracing::Span) -> Self {
        Self { inner: task, span }
    }

    /// Unwrap the inner task
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: PoolTask> PoolTask for TracedTask<T> {
    fn execute(&mut self) -> Result<()> {
        #[cfg(feature = "tracing")]
        let _guard = self.span.enter();
        self.inner.execute()
    }

    fn priority(&self) -> i64 {
        self.inner.priority()
    }

    fn on_failure(&mut self, error: Error) {
        #[cfg(feature = "tracing")]
        let _guard = self.span.enter();
        self.inner.on_failure(error);
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClosureTask;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_traced_task_executes() {
        let executed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&executed);

        let mut traced = TracedTask::new(ClosureTask::new(move || {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        }));
        traced.execute().expect("task should execute");

        assert!(executed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_traced_task_forwards_metadata() {
        let failed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&failed);

        let mut traced = TracedTask::new(
            ClosureTask::new(|| Err(Error::task_failed("nope")))
                .with_priority(-3)
                .with_name("inner")
                .with_failure_handler(move |_| flag.store(true, Ordering::SeqCst)),
        );

        assert_eq!(traced.priority(), -3);
        assert_eq!(traced.name(), "inner");

        let error = traced.execute().unwrap_err();
        traced.on_failure(error);
        assert!(failed.load(Ordering::SeqCst));
    }
}
