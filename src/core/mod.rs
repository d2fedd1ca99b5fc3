//! Core types and traits shared by the queues, pools and schedulers

pub mod cancellation;
pub mod error;
pub mod task;

pub use cancellation::CancellationToken;
pub(crate) use error::panic_message;
pub use error::{Error, Result};
pub use task::{BoxedTask, ClosureTask, PoolTask};
