//! Cooperative, single-threaded timer scheduler for an event-loop
//! driven host.
//!
//! Two priority queues, high and normal, are pumped once per host tick
//! via `SchedulerHandle::pump`. See `scheduler` for the pump policy.

pub mod clock;
pub mod config;
pub mod error;
pub mod host;
pub mod queue;
pub mod record;
pub mod scheduler;

pub use clock::{Clock, SystemClock, VirtualClock};
pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use host::{BetweenPassesHook, LogCrateSink, LogSink, NullLogSink};
pub use record::{Arg, Callback, CallbackId, CallbackOutput, TargetValue, TimerHandle, TimerRecord};
pub use scheduler::{PendingRecordView, SchedulerHandle};
