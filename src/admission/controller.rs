//! Concurrency limiting with deadline-based load shedding

use super::config::AdmissionConfig;
use super::stats::AdmissionStats;
use crate::core::{CancellationToken, Result};
use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use http::{Response, StatusCode};
use log::{debug, warn};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Destination for the status and body of a response
pub trait ResponseWriter {
    /// Set the response status
    fn write_status(&mut self, status: StatusCode);

    /// Append to the response body
    fn write_body(&mut self, body: &[u8]);
}

impl ResponseWriter for Response<Vec<u8>> {
    fn write_status(&mut self, status: StatusCode) {
        *self.status_mut() = status;
    }

    fn write_body(&mut self, body: &[u8]) {
        self.body_mut().extend_from_slice(body);
    }
}

/// Request handler guarded by an admission controller
pub trait Handler<Req, W: ResponseWriter + ?Sized> {
    /// Handle `request`, writing the response to `writer`
    fn handle(&self, request: Req, writer: &mut W);
}

impl<Req, W, F> Handler<Req, W> for F
where
    W: ResponseWriter + ?Sized,
    F: Fn(Req, &mut W),
{
    fn handle(&self, request: Req, writer: &mut W) {
        self(request, writer)
    }
}

/// How a request left the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// No limit configured; the handler ran unconditionally
    Passthrough,
    /// A slot was acquired and the handler ran
    Processed,
    /// The queue deadline elapsed; the timeout response was written
    TimedOut,
    /// The caller cancelled while queued; the client-closed status was written
    Cancelled,
}

/// Bounded slot pool; a slot is held by a message sitting in the channel
struct SlotPool {
    acquire: Sender<()>,
    release: Receiver<()>,
}

/// Bounds the number of requests processed at once.
///
/// A request first waits for one of `max_concurrent` slots. Whichever comes
/// first wins: the slot (the handler runs), the queue deadline (the
/// configured timeout response is written) or the caller's
/// [`CancellationToken`] (the client-closed status is written). With
/// `max_concurrent == 0` every request passes straight through.
///
/// # Example
///
/// ```rust
/// use http::{Response, StatusCode};
/// use rust_schedule_kit::admission::{Admission, AdmissionConfig, AdmissionController};
/// use rust_schedule_kit::CancellationToken;
///
/// # fn main() -> rust_schedule_kit::Result<()> {
/// let controller = AdmissionController::new(AdmissionConfig::new(4))?;
/// let mut response = Response::new(Vec::new());
///
/// let outcome = controller.serve(&CancellationToken::new(), &mut response, |w| {
///     w.body_mut().extend_from_slice(b"hello");
/// });
///
/// assert_eq!(outcome, Admission::Processed);
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(controller.stats().request_done, 1);
/// # Ok(())
/// # }
/// ```
pub struct AdmissionController {
    config: AdmissionConfig,
    deadline: Duration,
    timeout_status: StatusCode,
    client_closed_status: StatusCode,
    slots: Option<SlotPool>,

    incoming: AtomicU64,
    queued: AtomicI64,
    done: AtomicU64,
    timed_out: AtomicU64,
    cancelled: AtomicU64,
}

impl std::fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl AdmissionController {
    /// Create a controller.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a configured status code is not a valid
    /// HTTP status.
    pub fn new(config: AdmissionConfig) -> Result<Self> {
        let (timeout_status, client_closed_status) = config.status_codes()?;
        let slots = (config.max_concurrent > 0).then(|| {
            let (acquire, release) = channel::bounded(config.max_concurrent);
            SlotPool { acquire, release }
        });

        Ok(Self {
            deadline: config.queue_deadline(),
            timeout_status,
            client_closed_status,
            slots,
            config,
            incoming: AtomicU64::new(0),
            queued: AtomicI64::new(0),
            done: AtomicU64::new(0),
            timed_out: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
        })
    }

    /// The configuration this controller was built from
    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Admit one request and run `handler` if it gets a slot.
    ///
    /// The slot is released and the request counted as done when `handler`
    /// returns or unwinds.
    pub fn serve<W, F>(&self, token: &CancellationToken, writer: &mut W, handler: F) -> Admission
    where
        W: ResponseWriter + ?Sized,
        F: FnOnce(&mut W),
    {
        self.incoming.fetch_add(1, Ordering::Relaxed);

        let Some(slots) = &self.slots else {
            handler(writer);
            return Admission::Passthrough;
        };

        self.queued.fetch_add(1, Ordering::Relaxed);
        let deadline = channel::after(self.deadline);

        // Both ends of the slot channel live in `self`, so the send can't
        // observe a disconnect.
        select! {
            send(slots.acquire, ()) -> _ => {
                self.queued.fetch_sub(1, Ordering::Relaxed);
                let _slot = SlotGuard { controller: self, slots };
                handler(writer);
                Admission::Processed
            }
            recv(deadline) -> _ => {
                writer.write_status(self.timeout_status);
                writer.write_body(self.config.timeout_body.as_bytes());
                self.queued.fetch_sub(1, Ordering::Relaxed);
                self.timed_out.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "request shed after waiting {}ms for one of {} slots",
                    self.deadline.as_millis(),
                    self.config.max_concurrent
                );
                Admission::TimedOut
            }
            recv(token.done()) -> _ => {
                writer.write_status(self.client_closed_status);
                self.queued.fetch_sub(1, Ordering::Relaxed);
                self.cancelled.fetch_add(1, Ordering::Relaxed);
                debug!("request cancelled by caller while queued");
                Admission::Cancelled
            }
        }
    }

    /// Wrap `handler` so every call goes through this controller
    pub fn wrap<H>(self: &Arc<Self>, handler: H) -> Middleware<H> {
        Middleware {
            controller: Arc::clone(self),
            handler,
        }
    }

    /// Snapshot of the counters; lock-free
    pub fn stats(&self) -> AdmissionStats {
        AdmissionStats {
            throttles: self.slots.is_some(),
            request_incoming: self.incoming.load(Ordering::Relaxed),
            request_in_queue: self.queued.load(Ordering::Relaxed),
            request_in_processing: self.slots.as_ref().map_or(0, |slots| slots.release.len()),
            request_done: self.done.load(Ordering::Relaxed),
            request_wait_timeout: self.timed_out.load(Ordering::Relaxed),
            request_cancel: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

struct SlotGuard<'a> {
    controller: &'a AdmissionController,
    slots: &'a SlotPool,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let _ = self.slots.release.try_recv();
        self.controller.done.fetch_add(1, Ordering::Relaxed);
    }
}

/// A [`Handler`] guarded by a shared [`AdmissionController`]
pub struct Middleware<H> {
    controller: Arc<AdmissionController>,
    handler: H,
}

impl<H> Middleware<H> {
    /// Guard `handler` with `controller`
    pub fn new(controller: Arc<AdmissionController>, handler: H) -> Self {
        Self {
            controller,
            handler,
        }
    }

    /// The guarding controller
    pub fn controller(&self) -> &Arc<AdmissionController> {
        &self.controller
    }

    /// Serve one request through the controller
    pub fn serve<Req, W>(&self, request: Req, token: &CancellationToken, writer: &mut W) -> Admission
    where
        H: Handler<Req, W>,
        W: ResponseWriter + ?Sized,
    {
        self.controller
            .serve(token, writer, |w| self.handler.handle(request, w))
    }
}

impl<H> std::fmt::Debug for Middleware<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Middleware")
            .field("controller", &self.controller)
            .finish()
    }
}
