//! Collaborators a `Scheduler` is handed at construction: where
//! diagnostics go, and what runs between the high and normal pump
//! passes.

/// Where a `Scheduler` sends its informational/warning output.
pub trait LogSink {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Forwards to the `log` crate's global logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn info(&self, message: &str) {
        log::info!("{message}");
    }

    fn warn(&self, message: &str) {
        log::warn!("{message}");
    }
}

/// Discards everything. Used by tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}

/// Runs once between the high-priority drain pass and the
/// normal-priority pass of a single `pump` call, only when the high
/// pass fired nothing. Left unset by default.
pub trait BetweenPassesHook {
    fn run(&mut self);
}

impl<F> BetweenPassesHook for F
where
    F: FnMut(),
{
    fn run(&mut self) {
        (self)()
    }
}
