//! Error types for the scheduling toolkit

/// Result type for toolkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the toolkit
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Pool or scheduler was started twice
    #[error("'{name}' is already running with {worker_count} workers")]
    AlreadyRunning {
        /// Name of the pool or scheduler
        name: String,
        /// Number of worker threads
        worker_count: usize,
    },

    /// Pool or scheduler has been shut down and no longer accepts work
    #[error("'{name}' has been shut down")]
    ShutDown {
        /// Name of the pool or scheduler
        name: String,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{thread_id}: {message}")]
    SpawnError {
        /// ID of the thread that failed to spawn
        thread_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{thread_id}: {message}")]
    JoinError {
        /// ID of the thread that failed to join
        thread_id: usize,
        /// Error message
        message: String,
    },

    /// A task returned an error from its entry point
    #[error("Task failed: {message}")]
    TaskFailed {
        /// Error message
        message: String,
    },

    /// A task panicked inside its entry point
    #[error("Task panicked: {message}")]
    TaskPanicked {
        /// Panic payload rendered as text
        message: String,
    },

    /// Bounded queue is at capacity
    #[error("Queue is full: {current}/{max} elements queued")]
    QueueFull {
        /// Current queue length
        current: usize,
        /// Maximum queue length
        max: usize,
    },

    /// Queue has been closed
    #[error("Queue is closed")]
    QueueClosed,

    /// Malformed `HH:MM:SS` time-of-day string
    #[error("Invalid time of day '{value}': bad {field}")]
    InvalidTimeOfDay {
        /// The rejected input
        value: String,
        /// Which part of the input is malformed
        field: &'static str,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an already running error
    pub fn already_running(name: impl Into<String>, worker_count: usize) -> Self {
        Error::AlreadyRunning {
            name: name.into(),
            worker_count,
        }
    }

    /// Create a shut down error
    pub fn shut_down(name: impl Into<String>) -> Self {
        Error::ShutDown { name: name.into() }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        thread_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::SpawnError {
            thread_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread_id: usize, message: impl Into<String>) -> Self {
        Error::JoinError {
            thread_id,
            message: message.into(),
        }
    }

    /// Create a task failure error
    pub fn task_failed(message: impl Into<String>) -> Self {
        Error::TaskFailed {
            message: message.into(),
        }
    }

    /// Create a task panic error
    pub fn task_panicked(message: impl Into<String>) -> Self {
        Error::TaskPanicked {
            message: message.into(),
        }
    }

    /// Create a queue full error
    pub fn queue_full(current: usize, max: usize) -> Self {
        Error::QueueFull { current, max }
    }

    /// Create an invalid time-of-day error
    pub fn invalid_time_of_day(value: impl Into<String>, field: &'static str) -> Self {
        Error::InvalidTimeOfDay {
            value: value.into(),
            field,
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}

/// Render a `catch_unwind` payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
