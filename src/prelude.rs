//! Convenient re-exports for common types and traits

pub use crate::admission::{
    Admission, AdmissionConfig, AdmissionController, AdmissionStats, ResponseWriter,
};
pub use crate::cache::LruCache;
pub use crate::core::{BoxedTask, CancellationToken, ClosureTask, Error, PoolTask, Result};
pub use crate::pool::{PoolState, WorkerPool, WorkerPoolConfig, WorkerStats};
pub use crate::queue::{BlockingQueue, PriorityElement, PriorityQueue, PushError};
pub use crate::schedule::{
    now_unix, today_time, BoxedTimingTask, ScheduledClosure, SchedulerConfig, SchedulerHandle,
    TimingScheduler, TimingTask,
};
pub use crate::tracing::TracedTask;
