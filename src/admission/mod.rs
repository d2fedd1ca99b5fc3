//! Admission control for request handlers.
//!
//! An [`AdmissionController`] caps how many requests run a handler at once.
//! Requests beyond the cap wait for a slot until their queue deadline, after
//! which they are shed with a configurable status and body, or until the
//! caller cancels them.

mod config;
mod controller;
mod stats;

pub use config::{
    AdmissionConfig, CLIENT_CLOSED_REQUEST, DEFAULT_QUEUE_DEADLINE, DEFAULT_TIMEOUT_BODY,
    DEFAULT_TIMEOUT_STATUS,
};
pub use controller::{Admission, AdmissionController, Handler, Middleware, ResponseWriter};
pub use stats::AdmissionStats;
