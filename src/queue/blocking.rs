//! Bounded priority queue with blocking push and pop.

use super::priority::PriorityHeap;
use super::{PriorityElement, PushError};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// State guarded by the queue's single mutex
struct State<T> {
    heap: PriorityHeap<T>,
    closed: bool,
}

/// A priority queue with a capacity bound and wait/notify semantics.
///
/// Producers calling [`push`](Self::push) wait while the queue is full;
/// consumers calling [`pop`](Self::pop) wait while it is empty. Both
/// condition variables are paired with the one mutex that guards the heap
/// and the closed flag, and every wait re-checks its predicate after waking.
///
/// [`close`](Self::close) wakes every waiter. From then on pushes fail with
/// [`PushError::Closed`], and pops drain what is left before returning
/// `None` without blocking.
///
/// # Example
///
/// ```rust
/// use rust_schedule_kit::queue::BlockingQueue;
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(BlockingQueue::new(8, 8));
/// let consumer = {
///     let queue = Arc::clone(&queue);
///     thread::spawn(move || queue.pop())
/// };
///
/// queue.push(42i64).unwrap();
/// assert_eq!(consumer.join().unwrap(), Some(42));
/// ```
pub struct BlockingQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    max_size: usize,
}

impl<T: PriorityElement> BlockingQueue<T> {
    /// Create a queue.
    ///
    /// `max_size` of 0 means unbounded. A non-zero `max_size` smaller than
    /// `initial_capacity` is raised to `initial_capacity`.
    pub fn new(initial_capacity: usize, max_size: usize) -> Self {
        let max_size = if max_size > 0 && max_size < initial_capacity {
            initial_capacity
        } else {
            max_size
        };

        Self {
            state: Mutex::new(State {
                heap: PriorityHeap::with_capacity(initial_capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            max_size,
        }
    }

    /// Create an unbounded queue
    pub fn unbounded() -> Self {
        Self::new(0, 0)
    }

    fn is_full(&self, state: &State<T>) -> bool {
        self.max_size > 0 && state.heap.len() >= self.max_size
    }

    /// Push without waiting.
    ///
    /// # Errors
    ///
    /// - [`PushError::Closed`] if the queue has been closed
    /// - [`PushError::Full`] if the queue holds `max_size` elements
    pub fn try_push(&self, element: T) -> Result<(), PushError<T>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(PushError::Closed(element));
        }
        if self.is_full(&state) {
            return Err(PushError::Full(element));
        }

        state.heap.push(element);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Push, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Closed`] if the queue is closed before or while
    /// waiting; the element is handed back rather than dropped.
    pub fn push(&self, element: T) -> Result<(), PushError<T>> {
        let mut state = self.state.lock();
        while !state.closed && self.is_full(&state) {
            self.not_full.wait(&mut state);
        }
        if state.closed {
            return Err(PushError::Closed(element));
        }

        state.heap.push(element);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Pop without waiting; `None` if empty
    pub fn try_pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        let element = state.heap.pop();
        self.release_one(state, element.is_some());
        element
    }

    /// Pop everything without waiting, in priority order
    pub fn try_pop_all(&self) -> Vec<T> {
        let mut state = self.state.lock();
        let elements = state.heap.pop_all();
        self.release_all(state, !elements.is_empty());
        elements
    }

    /// Pop, waiting while the queue is empty and open.
    ///
    /// Returns `None` only once the queue is closed and drained.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        while !state.closed && state.heap.is_empty() {
            self.not_empty.wait(&mut state);
        }

        let element = state.heap.pop();
        self.release_one(state, element.is_some());
        element
    }

    /// Pop everything, waiting while the queue is empty and open.
    ///
    /// Returns an empty vector only once the queue is closed and drained.
    pub fn pop_all(&self) -> Vec<T> {
        let mut state = self.state.lock();
        while !state.closed && state.heap.is_empty() {
            self.not_empty.wait(&mut state);
        }

        let elements = state.heap.pop_all();
        self.release_all(state, !elements.is_empty());
        elements
    }

    /// Pop, waiting at most `timeout` for an element.
    ///
    /// A timeout too large to represent as a deadline waits like [`pop`](Self::pop).
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        while !state.closed && state.heap.is_empty() {
            match deadline {
                Some(deadline) => {
                    if self.not_empty.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
                None => self.not_empty.wait(&mut state),
            }
        }

        let element = state.heap.pop();
        self.release_one(state, element.is_some());
        element
    }

    /// Close the queue and wake every waiting producer and consumer.
    ///
    /// Idempotent. Elements still queued stay poppable.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        drop(state);

        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of queued elements
    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.state.lock().heap.is_empty()
    }

    /// Capacity bound, 0 when unbounded
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn release_one(&self, state: MutexGuard<'_, State<T>>, removed: bool) {
        drop(state);
        if removed && self.max_size > 0 {
            self.not_full.notify_one();
        }
    }

    fn release_all(&self, state: MutexGuard<'_, State<T>>, removed: bool) {
        drop(state);
        if removed && self.max_size > 0 {
            self.not_full.notify_all();
        }
    }
}
