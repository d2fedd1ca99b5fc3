//! Admission controller configuration

use crate::core::{Error, Result};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Queue deadline used when none (or 0) is configured
pub const DEFAULT_QUEUE_DEADLINE: Duration = Duration::from_millis(60_000);

/// Status written when a request's queue deadline elapses
pub const DEFAULT_TIMEOUT_STATUS: u16 = 503;

/// Status written when the client gives up while queued
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Body written when a request's queue deadline elapses
pub const DEFAULT_TIMEOUT_BODY: &str =
    "Deadline exceeded while waiting in incoming queue, please reduce your request rate";

/// Configuration for an [`AdmissionController`](super::AdmissionController)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Requests processed at once (0 = no limit, every request passes through)
    pub max_concurrent: usize,
    /// Longest a request waits for a slot, in milliseconds (0 = 60 000)
    pub queue_deadline_ms: u64,
    /// Status written on deadline expiry
    pub timeout_status: u16,
    /// Body written on deadline expiry
    pub timeout_body: String,
    /// Status written when the caller cancels while queued
    pub client_closed_status: u16,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 0,
            queue_deadline_ms: DEFAULT_QUEUE_DEADLINE.as_millis() as u64,
            timeout_status: DEFAULT_TIMEOUT_STATUS,
            timeout_body: DEFAULT_TIMEOUT_BODY.to_string(),
            client_closed_status: CLIENT_CLOSED_REQUEST,
        }
    }
}

impl AdmissionConfig {
    /// Limit processing to `max_concurrent` requests at once
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::invalid_config("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set how long a request may wait for a slot.
    ///
    /// Stored in whole milliseconds: a non-zero deadline under 1ms rounds up
    /// to 1ms, and `Duration::ZERO` selects the default.
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_queue_deadline(mut self, deadline: Duration) -> Self {
        self.queue_deadline_ms = match u64::try_from(deadline.as_millis()) {
            Ok(0) if !deadline.is_zero() => 1,
            Ok(ms) => ms,
            Err(_) => u64::MAX,
        };
        self
    }

    /// Set the status written on deadline expiry
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_timeout_status(mut self, status: u16) -> Self {
        self.timeout_status = status;
        self
    }

    /// Set the body written on deadline expiry
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_timeout_body<S: Into<String>>(mut self, body: S) -> Self {
        self.timeout_body = body.into();
        self
    }

    /// Set the status written when the caller cancels
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_client_closed_status(mut self, status: u16) -> Self {
        self.client_closed_status = status;
        self
    }

    /// Effective queue deadline; 0 means the 60 s default
    pub fn queue_deadline(&self) -> Duration {
        if self.queue_deadline_ms == 0 {
            DEFAULT_QUEUE_DEADLINE
        } else {
            Duration::from_millis(self.queue_deadline_ms)
        }
    }

    pub(crate) fn status_codes(&self) -> Result<(StatusCode, StatusCode)> {
        let parse = |parameter: &str, code: u16| {
            StatusCode::from_u16(code).map_err(|e| Error::invalid_config(parameter, e.to_string()))
        };
        Ok((
            parse("timeout_status", self.timeout_status)?,
            parse("client_closed_status", self.client_closed_status)?,
        ))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.status_codes().map(|_| ())
    }
}
