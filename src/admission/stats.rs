//! Point-in-time admission counters

use serde::{Deserialize, Serialize};

/// Snapshot of an [`AdmissionController`](super::AdmissionController)'s counters.
///
/// Each field is read with its own atomic load, so a snapshot taken under
/// load is not a single consistent cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionStats {
    /// Whether a concurrency limit is in effect
    pub throttles: bool,
    /// Requests received
    pub request_incoming: u64,
    /// Requests waiting for a slot
    pub request_in_queue: i64,
    /// Requests holding a slot
    pub request_in_processing: usize,
    /// Requests whose handler has returned
    pub request_done: u64,
    /// Requests shed because the queue deadline elapsed
    pub request_wait_timeout: u64,
    /// Requests abandoned by the caller while queued
    pub request_cancel: u64,
}

impl AdmissionStats {
    /// Requests that have left the controller one way or another
    pub fn request_settled(&self) -> u64 {
        self.request_done + self.request_wait_timeout + self.request_cancel
    }
}
