//! Request cancellation
//!
//! A [`CancellationToken`] is the caller-side signal the admission
//! controller races against slot acquisition and its deadline. Besides the
//! usual [`is_cancelled`](CancellationToken::is_cancelled) check it exposes a
//! [`done`](CancellationToken::done) channel that becomes ready once the token
//! is cancelled, so it can take part in a `crossbeam::select!`.
//!
//! # Example
//!
//! ```rust
//! use rust_schedule_kit::CancellationToken;
//!
//! let parent = CancellationToken::new();
//! let child = parent.child();
//!
//! parent.cancel();
//! assert!(child.is_cancelled());
//! assert!(child.done().recv().is_err());
//! ```

use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

struct TokenInner {
    cancelled: AtomicBool,
    /// Dropped on cancel, which disconnects `done`
    signal: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
    children: Mutex<Vec<Weak<TokenInner>>>,
}

impl TokenInner {
    fn new() -> Self {
        let (signal, done) = channel::bounded(0);
        Self {
            cancelled: AtomicBool::new(false),
            signal: Mutex::new(Some(signal)),
            done,
            children: Mutex::new(Vec::new()),
        }
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        drop(self.signal.lock().take());

        let children = std::mem::take(&mut *self.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

/// A thread-safe, cloneable cancellation signal
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancellationToken {
    /// Create a new token (not cancelled)
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner::new()),
        }
    }

    /// Create a child token that is cancelled together with this one.
    ///
    /// If this token is already cancelled the child starts cancelled.
    pub fn child(&self) -> Self {
        let child = Self::new();
        {
            let mut children = self.inner.children.lock();
            children.retain(|weak| weak.strong_count() > 0);
            children.push(Arc::downgrade(&child.inner));
        }

        if self.is_cancelled() {
            child.cancel();
        }
        child
    }

    /// Create a token that cancels itself after `timeout`.
    ///
    /// A background thread waits for the timeout or for an earlier cancel,
    /// whichever comes first.
    pub fn with_timeout(timeout: Duration) -> Self {
        let token = Self::new();
        token.spawn_timer(timeout);
        token
    }

    fn spawn_timer(&self, timeout: Duration) -> thread::JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let done = self.inner.done.clone();

        thread::spawn(move || {
            select! {
                recv(channel::after(timeout)) -> _ => {
                    if let Some(inner) = weak.upgrade() {
                        inner.cancel();
                    }
                }
                recv(done) -> _ => {}
            }
        })
    }

    /// Cancel this token and all of its children. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Check if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// A receiver that never yields a message and disconnects on cancel.
    ///
    /// Use it as `recv(token.done()) -> _` inside `crossbeam::select!`.
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
