//! `Scheduler`: the two-queue pump policy, cancellation/lookup
//! protocol, and clock-skew adjustment that tie `TimerQueue` and
//! `TimerRecord` together into the public API.
//!
//! `SchedulerHandle<T>` is a cheap `Rc<RefCell<Scheduler<T>>>` clone.
//! Every public method takes `&self` and releases its `borrow_mut`
//! before invoking any callback, so a callback can reentrantly call
//! back through the same handle.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::host::{BetweenPassesHook, LogSink, NullLogSink};
use crate::record::{Arg, Callback, CallbackId, CallbackOutput, TargetValue, TimerHandle, TimerRecord};
use crate::queue::TimerQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Priority {
    High,
    Normal,
}

/// A snapshot of one pending record, for introspection.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRecordView {
    pub target: String,
    pub fire_at: f64,
    pub callback_id: CallbackId,
    pub handle: TimerHandle,
}

struct Scheduler<T> {
    high: TimerQueue<T>,
    normal: TimerQueue<T>,
    config: SchedulerConfig,
    clock: Box<dyn Clock>,
    log_sink: Box<dyn LogSink>,
    between_passes: Option<Box<dyn BetweenPassesHook>>,
    next_id: u64,
}

impl<T> Scheduler<T> {
    fn next_handle(&mut self) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        TimerHandle { id }
    }
}

/// Shared handle to a `Scheduler<T>`. Cloning is an `Rc` bump; every
/// clone observes the same queues.
pub struct SchedulerHandle<T>(Rc<RefCell<Scheduler<T>>>);

impl<T> Clone for SchedulerHandle<T> {
    fn clone(&self) -> Self {
        SchedulerHandle(Rc::clone(&self.0))
    }
}

impl<T> fmt::Debug for SchedulerHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle").finish_non_exhaustive()
    }
}

/// RAII guard that clears a queue's reentrancy flag when dropped,
/// including on an early return via `?` or a panic unwinding through
/// `pump`. Holds a cloned `SchedulerHandle` rather than a live borrow,
/// so it stays in scope while `invoke` releases and re-acquires the
/// `RefCell` per callback call.
struct PassGuard<T> {
    handle: SchedulerHandle<T>,
    priority: Priority,
}

impl<T> PassGuard<T> {
    fn acquire(handle: &SchedulerHandle<T>, priority: Priority) -> Option<Self> {
        let began = {
            let mut s = handle.0.borrow_mut();
            match priority {
                Priority::High => s.high.begin_run(),
                Priority::Normal => s.normal.begin_run(),
            }
        };
        if began {
            Some(PassGuard {
                handle: handle.clone(),
                priority,
            })
        } else {
            None
        }
    }
}

impl<T> Drop for PassGuard<T> {
    fn drop(&mut self) {
        let mut s = self.handle.0.borrow_mut();
        match self.priority {
            Priority::High => s.high.end_run(),
            Priority::Normal => s.normal.end_run(),
        }
    }
}

impl<T: TargetValue> SchedulerHandle<T> {
    /// Build a scheduler around the given config, clock, and log sink.
    pub fn new(config: SchedulerConfig, clock: Box<dyn Clock>, log_sink: Box<dyn LogSink>) -> Self {
        SchedulerHandle(Rc::new(RefCell::new(Scheduler {
            high: TimerQueue::new(),
            normal: TimerQueue::new(),
            config,
            clock,
            log_sink,
            between_passes: None,
            next_id: 1,
        })))
    }

    /// Install (or clear, with `None`) the hook that runs between the
    /// high-priority and normal-priority passes of a `pump` call.
    pub fn set_between_passes_hook(&self, hook: Option<Box<dyn BetweenPassesHook>>) {
        self.0.borrow_mut().between_passes = hook;
    }

    /// Schedule `callback` on the normal queue. Fails without
    /// inserting anything if the queue is already at capacity.
    #[allow(clippy::too_many_arguments)]
    pub fn schedule_normal(
        &self,
        target: T,
        fire_at: f64,
        callback_id: CallbackId,
        callback: impl Callback<T> + 'static,
        args: Vec<Arg>,
    ) -> Result<TimerHandle, SchedulerError> {
        let mut s = self.0.borrow_mut();
        let cap = s.config.normal_queue_cap;
        let len = s.normal.len();
        if len + 1 > cap {
            return Err(SchedulerError::QueueOverflow { len, limit: cap });
        }
        let now = s.clock.now();
        if fire_at < now {
            s.log_sink.info(&format!(
                "schedule_normal: fire_at {fire_at} is in the past (now {now})"
            ));
        }
        let handle = s.next_handle();
        s.normal.insert(TimerRecord {
            fire_at,
            target,
            callback_id,
            callback: Box::new(callback),
            args,
            handle,
        });
        Ok(handle)
    }

    /// Schedule `callback` on the high-priority queue. Unlike the
    /// normal queue, this queue has no capacity limit — callers are
    /// trusted not to flood it.
    pub fn schedule_high(
        &self,
        target: T,
        fire_at: f64,
        callback_id: CallbackId,
        callback: impl Callback<T> + 'static,
        args: Vec<Arg>,
    ) -> TimerHandle {
        let mut s = self.0.borrow_mut();
        let now = s.clock.now();
        if fire_at < now {
            s.log_sink.info(&format!(
                "schedule_high: fire_at {fire_at} is in the past (now {now})"
            ));
        }
        let handle = s.next_handle();
        s.high.insert(TimerRecord {
            fire_at,
            target,
            callback_id,
            callback: Box::new(callback),
            args,
            handle,
        });
        handle
    }

    /// Remove every pending record matching both `target` and
    /// `callback_id`, across both queues. Returns the number removed.
    pub fn cancel_matching(&self, target: &T, callback_id: CallbackId) -> usize {
        if target.is_unit() {
            return 0;
        }
        let mut s = self.0.borrow_mut();
        let removed_high = s.high.remove_matching(target, callback_id).len();
        let removed_normal = s.normal.remove_matching(target, callback_id).len();
        removed_high + removed_normal
    }

    /// Remove at most one record matching both criteria (high queue
    /// searched first). Returns whether anything was removed.
    pub fn cancel_one_matching(&self, target: &T, callback_id: CallbackId) -> bool {
        if target.is_unit() {
            return false;
        }
        let mut s = self.0.borrow_mut();
        if s.high.remove_one_matching(target, callback_id).is_some() {
            return true;
        }
        s.normal.remove_one_matching(target, callback_id).is_some()
    }

    /// Remove every record whose target matches, irrespective of
    /// callback identity.
    pub fn cancel_by_target(&self, target: &T) -> usize {
        let mut s = self.0.borrow_mut();
        let removed_high = s.high.remove_by_target(target);
        let removed_normal = s.normal.remove_by_target(target);
        removed_high + removed_normal
    }

    /// Remove exactly the record named by `handle`. A stale or
    /// already-cancelled handle is a logged no-op, not an error.
    pub fn cancel_specific(&self, handle: TimerHandle) -> bool {
        let mut s = self.0.borrow_mut();
        if s.high.remove_specific(handle).is_some() {
            return true;
        }
        if s.normal.remove_specific(handle).is_some() {
            return true;
        }
        s.log_sink
            .warn(&format!("cancel_specific: handle {handle:?} not found"));
        false
    }

    /// Count pending records matching both `target` and
    /// `callback_id`, across both queues.
    pub fn count_matching(&self, target: &T, callback_id: CallbackId) -> usize {
        let s = self.0.borrow();
        s.high.count_matching(target, callback_id) + s.normal.count_matching(target, callback_id)
    }

    /// Remove the first record matching both criteria (high queue
    /// searched first) and invoke its callback immediately. A callback
    /// error is logged and swallowed.
    pub fn fire_one_matching(&self, target: &T, callback_id: CallbackId) -> Option<CallbackOutput> {
        let removed = {
            let mut s = self.0.borrow_mut();
            s.high
                .remove_one_matching(target, callback_id)
                .or_else(|| s.normal.remove_one_matching(target, callback_id))
        };
        let mut record = removed?;
        match record.callback.call(&record.target, &record.args, self) {
            Ok(output) => Some(output),
            Err(e) => {
                self.0
                    .borrow()
                    .log_sink
                    .warn(&format!("fire_one_matching: callback failed: {e}"));
                None
            }
        }
    }

    /// Time remaining until the earliest eligible record fires,
    /// clamped to zero if already due. A queue currently mid-pump is
    /// skipped. `None` if neither queue has an eligible candidate.
    pub fn time_until_next(&self, now: f64) -> Option<Duration> {
        let s = self.0.borrow();
        let high = if !s.high.is_running() {
            s.high.head_fire_at()
        } else {
            None
        };
        let normal = if !s.normal.is_running() {
            s.normal.head_fire_at()
        } else {
            None
        };
        let candidate = match (high, normal) {
            (Some(h), Some(n)) => h.min(n),
            (Some(h), None) => h,
            (None, Some(n)) => n,
            (None, None) => return None,
        };
        Some(Duration::from_secs_f64((candidate - now).max(0.0)))
    }

    /// Add `delta` to every pending record's `fire_at`, in both
    /// queues. Not for use from within a callback; calling it while a
    /// queue is mid-pump is logged but not blocked.
    pub fn adjust_all(&self, delta: f64) {
        let mut s = self.0.borrow_mut();
        if s.high.is_running() || s.normal.is_running() {
            s.log_sink.warn(
                "adjust_all called while a pump pass is in progress; fire times may be inconsistent",
            );
        }
        s.high.shift_all(delta);
        s.normal.shift_all(delta);
    }

    /// Snapshot every pending record across both queues, in queue
    /// order (high first, each internally sorted by `fire_at`).
    pub fn list_pending(&self) -> Vec<PendingRecordView> {
        let s = self.0.borrow();
        s.high
            .iter()
            .chain(s.normal.iter())
            .map(|r| PendingRecordView {
                target: format!("{:?}", r.target()),
                fire_at: r.fire_at(),
                callback_id: r.callback_id(),
                handle: r.handle(),
            })
            .collect()
    }

    /// Drain every due high-priority record; only if none fired, run
    /// the between-passes hook and fire at most one due normal-priority
    /// record. Reentrant: a callback may call back into any
    /// `SchedulerHandle` method, including `pump` itself. A queue
    /// already mid-pump is skipped rather than blocking.
    pub fn pump(&self, now: f64) -> Result<(), SchedulerError> {
        let mut fired_high = false;
        match PassGuard::acquire(self, Priority::High) {
            Some(_guard) => loop {
                let due = { self.0.borrow_mut().high.pop_due(now) };
                match due {
                    Some(record) => {
                        fired_high = true;
                        self.invoke(record)?;
                    }
                    None => break,
                }
            },
            None => {
                self.0
                    .borrow()
                    .log_sink
                    .info("pump: high queue already running, skipping this pass");
                return Ok(());
            }
        }

        if fired_high {
            return Ok(());
        }

        self.run_between_passes_hook();

        match PassGuard::acquire(self, Priority::Normal) {
            Some(_guard) => {
                let due = { self.0.borrow_mut().normal.pop_due(now) };
                if let Some(record) = due {
                    self.invoke(record)?;
                }
            }
            None => {
                self.0
                    .borrow()
                    .log_sink
                    .info("pump: normal queue already running, skipping this pass");
            }
        }

        Ok(())
    }

    fn invoke(&self, mut record: TimerRecord<T>) -> Result<(), SchedulerError> {
        record
            .callback
            .call(&record.target, &record.args, self)
            .map(|_| ())
            .map_err(SchedulerError::CallbackFault)
    }

    fn run_between_passes_hook(&self) {
        let mut hook = match self.0.borrow_mut().between_passes.take() {
            Some(hook) => hook,
            None => return,
        };
        hook.run();
        let mut s = self.0.borrow_mut();
        if s.between_passes.is_none() {
            s.between_passes = Some(hook);
        }
    }
}

impl<T: TargetValue> SchedulerHandle<T> {
    /// A scheduler with default config, a real system clock, and a
    /// discarding log sink.
    pub fn new_null() -> Self {
        use crate::clock::SystemClock;
        Self::new(
            SchedulerConfig::default(),
            Box::new(SystemClock),
            Box::new(NullLogSink),
        )
    }
}
