//! Wall-clock task scheduling.
//!
//! A [`TimingScheduler`] keeps [`TimingTask`]s in a min-heap keyed by their
//! due timestamp. Workers poll the heap on a fixed interval rather than
//! being woken, so a task starts at most one interval after it becomes due
//! and never before.

mod clock;
mod task;
mod timing;

pub use clock::{now_unix, today_time};
pub use task::{BoxedTimingTask, ScheduledClosure, TimingTask};
pub use timing::{SchedulerConfig, SchedulerHandle, SchedulerPhase, TimingScheduler};
