//! The scheduler's unit of work: `TimerRecord`, its cancellation
//! `TimerHandle`, and the `Callback`/`CallbackId`/`Arg` capability set.

use std::any::Any;
use std::fmt;

use crate::scheduler::SchedulerHandle;

/// A caller-supplied identity for a callback *site*, used only for
/// cancellation/lookup matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(pub u64);

/// A captured callback argument.
#[derive(Debug, Clone)]
pub enum Arg {
    Int(i64),
    Float(f64),
    Text(String),
    Opaque(std::sync::Arc<dyn Any>),
}

/// Result of invoking a callback.
pub type CallbackOutput = Box<dyn Any>;

/// A scheduled unit of work. Boxed so `TimerQueue` can store callbacks
/// with different captured closures behind one type.
pub trait Callback<T> {
    fn call(
        &mut self,
        target: &T,
        args: &[Arg],
        scheduler: &SchedulerHandle<T>,
    ) -> Result<CallbackOutput, String>;
}

impl<T, F> Callback<T> for F
where
    F: FnMut(&T, &[Arg], &SchedulerHandle<T>) -> Result<CallbackOutput, String>,
{
    fn call(
        &mut self,
        target: &T,
        args: &[Arg],
        scheduler: &SchedulerHandle<T>,
    ) -> Result<CallbackOutput, String> {
        (self)(target, args, scheduler)
    }
}

/// A caller-supplied identity used for batched cancellation
/// (`cancel_by_target`) and for matching alongside a `CallbackId`
/// (`cancel_matching`). `()` is the unit target for timers with no
/// natural owner.
pub trait TargetValue: fmt::Debug {
    fn eq_target(&self, other: &dyn TargetValue) -> bool;
    fn clone_target(&self) -> Box<dyn TargetValue>;
    fn as_any(&self) -> &dyn Any;

    /// True for the unit target `()`.
    fn is_unit(&self) -> bool {
        self.as_any().is::<()>()
    }
}

impl<T> TargetValue for T
where
    T: fmt::Debug + PartialEq + Clone + 'static,
{
    fn eq_target(&self, other: &dyn TargetValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map(|o| self == o)
            .unwrap_or(false)
    }

    fn clone_target(&self) -> Box<dyn TargetValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Opaque cancellation token naming exactly one `TimerRecord`. Wraps a
/// monotonically increasing id, never reused for the scheduler's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    pub(crate) id: u64,
}

/// An immutable scheduled callback. Every field except `fire_at` is
/// fixed at construction.
pub struct TimerRecord<T> {
    pub(crate) fire_at: f64,
    pub(crate) target: T,
    pub(crate) callback_id: CallbackId,
    pub(crate) callback: Box<dyn Callback<T>>,
    pub(crate) args: Vec<Arg>,
    pub(crate) handle: TimerHandle,
}

impl<T> fmt::Debug for TimerRecord<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerRecord")
            .field("fire_at", &self.fire_at)
            .field("target", &self.target)
            .field("callback_id", &self.callback_id)
            .field("handle", &self.handle)
            .finish()
    }
}

impl<T> TimerRecord<T> {
    pub fn fire_at(&self) -> f64 {
        self.fire_at
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn callback_id(&self) -> CallbackId {
        self.callback_id
    }

    pub fn handle(&self) -> TimerHandle {
        self.handle
    }
}
