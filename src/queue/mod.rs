//! Priority-ordered queues.
//!
//! - [`PriorityQueue`]: a mutex-guarded min-heap, never blocks
//! - [`BlockingQueue`]: the same heap with a capacity bound, a close flag and
//!   guarded condition-variable waits for producers and consumers
//!
//! Elements expose their ordering key through [`PriorityElement`]; lower
//! values are served first and equal priorities have no defined order.
//!
//! ```rust
//! use rust_schedule_kit::queue::{BlockingQueue, PushError};
//!
//! let queue = BlockingQueue::new(2, 2);
//! queue.try_push(5i64).unwrap();
//! queue.try_push(1i64).unwrap();
//!
//! assert!(matches!(queue.try_push(3i64), Err(PushError::Full(3))));
//! assert_eq!(queue.pop(), Some(1));
//! ```

mod blocking;
mod priority;

pub use blocking::BlockingQueue;
pub use priority::{PriorityHeap, PriorityQueue};

use crate::core::Error;
use std::fmt;

/// A value with a signed ordering key; lower values are more urgent.
pub trait PriorityElement {
    /// The ordering key
    fn priority(&self) -> i64;
}

impl PriorityElement for i64 {
    fn priority(&self) -> i64 {
        *self
    }
}

/// Error returned by a push that was not accepted. Carries the element back.
#[derive(PartialEq, Eq, Clone, Copy)]
pub enum PushError<T> {
    /// Bounded queue is at `max_size`
    Full(T),
    /// Queue has been closed
    Closed(T),
}

impl<T> PushError<T> {
    /// Recover the rejected element
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(element) | PushError::Closed(element) => element,
        }
    }

    /// Whether the push failed because the queue was full
    pub fn is_full(&self) -> bool {
        matches!(self, PushError::Full(_))
    }

    /// Whether the push failed because the queue was closed
    pub fn is_closed(&self) -> bool {
        matches!(self, PushError::Closed(_))
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => write!(f, "Full(..)"),
            PushError::Closed(_) => write!(f, "Closed(..)"),
        }
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => write!(f, "queue is full"),
            PushError::Closed(_) => write!(f, "queue is closed"),
        }
    }
}

impl<T> std::error::Error for PushError<T> {}

impl<T> PushError<T> {
    /// Convert into the crate error, reading `Full` details from the rejecting queue
    pub fn into_error(self, queue: &BlockingQueue<T>) -> Error
    where
        T: PriorityElement,
    {
        match self {
            PushError::Full(_) => Error::queue_full(queue.len(), queue.max_size()),
            PushError::Closed(_) => Error::QueueClosed,
        }
    }
}
