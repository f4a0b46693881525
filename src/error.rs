//! Typed scheduler errors.

use thiserror::Error;

/// Errors a `Scheduler` operation can fail with.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The normal queue would exceed its configured capacity. No
    /// record is inserted when this is returned.
    #[error("normal queue overflow: {len} pending records (limit {limit})")]
    QueueOverflow { len: usize, limit: usize },

    /// A callback returned `Err` during `pump`.
    #[error("callback failed: {0}")]
    CallbackFault(String),
}
