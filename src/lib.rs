//! # Rust Schedule Kit
//!
//! Concurrency and scheduling primitives for thread-based services.
//!
//! ## Features
//!
//! - **Priority Queue**: thread-safe min-heap keyed by an `i64` priority
//! - **Blocking Queue**: bounded priority queue whose producers wait while it is full
//!   and whose consumers wait while it is empty
//! - **Worker Pool**: fixed set of threads draining a blocking queue, with
//!   per-task failure and panic isolation
//! - **Timing Scheduler**: runs tasks no earlier than their wall-clock due time
//! - **Admission Control**: caps concurrent request handling and sheds
//!   requests that wait too long
//! - **LRU Cache**: fixed-capacity cache with optional time-to-live
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_schedule_kit::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WorkerPool::with_workers(4)?;
//! pool.start()?;
//!
//! for i in 0..10 {
//!     pool.execute_with_priority(
//!         move || {
//!             println!("Task {} executing", i);
//!             Ok(())
//!         },
//!         10 - i,
//!     )?;
//! }
//!
//! pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Tasks
//!
//! ```rust
//! use rust_schedule_kit::prelude::*;
//!
//! struct Resize {
//!     path: String,
//! }
//!
//! impl PoolTask for Resize {
//!     fn execute(&mut self) -> Result<()> {
//!         println!("Resizing {}", self.path);
//!         Ok(())
//!     }
//!
//!     fn on_failure(&mut self, error: Error) {
//!         eprintln!("resize of {} failed: {}", self.path, error);
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Resize"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! # let pool = WorkerPool::with_workers(2)?;
//! # pool.start()?;
//! pool.push(Resize {
//!     path: "cat.png".to_string(),
//! })?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Timed Tasks
//!
//! ```rust
//! use rust_schedule_kit::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let config = SchedulerConfig::new(2).with_poll_interval(Duration::from_millis(100));
//! let scheduler = TimingScheduler::new(config, Vec::new())?;
//! scheduler.start()?;
//!
//! scheduler.push(ScheduledClosure::new(now_unix() + 1, |_| {
//!     println!("one second later");
//!     Ok(())
//! }))?;
//! # scheduler.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod admission;
pub mod cache;
pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;
pub mod schedule;
pub mod tracing;

pub use crate::core::{BoxedTask, CancellationToken, ClosureTask, Error, PoolTask, Result};
pub use crate::pool::{WorkerPool, WorkerPoolConfig, WorkerStats};
