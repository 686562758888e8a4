/// Typed error surface for the job registry and scheduler
///
/// The store and scheduler return these directly so callers can map them to
/// precise HTTP status codes. Dispatch failures have their own type because
/// they follow a different propagation policy: absorbed by default, surfaced
/// only in strict mode.

use thiserror::Error;

use crate::job::types::Engine;

/// Errors produced by the job registry and the cron scheduler.
#[derive(Debug, Error)]
pub enum JobError {
    /// The registry file could not be read or written.
    #[error("job registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The registry file exists but does not parse as a job array.
    #[error("job registry is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// An add was attempted with an id that is already registered.
    #[error("a job with id '{0}' already exists")]
    DuplicateId(String),

    /// The schedule is not a valid 5-field cron expression.
    #[error("invalid cron schedule '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },

    /// The timer runtime failed while registering or removing a job.
    #[error("scheduler runtime error: {0}")]
    Scheduler(String),
}

/// Errors from a live engine dispatch attempt.
///
/// In default mode these never leave the dispatcher; they are converted to
/// the synthetic mock result. Strict mode returns them to the caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The engine replied with a non-success status code.
    #[error("{engine} API error: status {status}")]
    EngineStatus { engine: Engine, status: u16 },

    /// Transport failure: connection refused, timeout, or unreadable body.
    #[error("engine request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
