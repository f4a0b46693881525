//! Black-box scenarios S1-S6 from spec.md §8, exercised purely through
//! the public `phosphor_scheduler` API (no access to crate-internal
//! fields). Unit-level coverage of the same invariants lives alongside
//! each module in `src/`; this file is the cross-module integration
//! suite SPEC_FULL.md promises.

use std::cell::RefCell;
use std::rc::Rc;

use phosphor_scheduler::{
    Arg, CallbackId, CallbackOutput, NullLogSink, SchedulerConfig, SchedulerHandle, VirtualClock,
};

fn scheduler_with_clock(start: f64, cap: usize) -> (SchedulerHandle<String>, Rc<VirtualClock>) {
    let clock = Rc::new(VirtualClock::new(start));
    struct ClockHandle(Rc<VirtualClock>);
    impl phosphor_scheduler::Clock for ClockHandle {
        fn now(&self) -> f64 {
            self.0.now()
        }
    }
    let scheduler = SchedulerHandle::new(
        SchedulerConfig {
            normal_queue_cap: cap,
            log_level: None,
        },
        Box::new(ClockHandle(Rc::clone(&clock))),
        Box::new(NullLogSink),
    );
    (scheduler, clock)
}

fn recording_callback(
    order: &Rc<RefCell<Vec<&'static str>>>,
    label: &'static str,
) -> impl FnMut(&String, &[Arg], &SchedulerHandle<String>) -> Result<CallbackOutput, String> {
    let order = Rc::clone(order);
    move |_target: &String, _args: &[Arg], _scheduler: &SchedulerHandle<String>| {
        order.borrow_mut().push(label);
        Ok(Box::new(()) as CallbackOutput)
    }
}

/// S1 Ordering: normal A at t=1.0, B at t=0.5, C at t=2.0. Three
/// successive `pump(3.0)` calls fire B, then A, then C — fire order
/// follows `fire_at`, not scheduling order.
#[test]
fn s1_ordering_fires_by_fire_at_not_scheduling_order() {
    let (s, _clock) = scheduler_with_clock(0.0, 500);
    let order = Rc::new(RefCell::new(Vec::new()));

    s.schedule_normal(
        "A".to_string(),
        1.0,
        CallbackId(1),
        recording_callback(&order, "A"),
        vec![],
    )
    .unwrap();
    s.schedule_normal(
        "B".to_string(),
        0.5,
        CallbackId(1),
        recording_callback(&order, "B"),
        vec![],
    )
    .unwrap();
    s.schedule_normal(
        "C".to_string(),
        2.0,
        CallbackId(1),
        recording_callback(&order, "C"),
        vec![],
    )
    .unwrap();

    s.pump(3.0).unwrap();
    assert_eq!(*order.borrow(), vec!["B"]);
    s.pump(3.0).unwrap();
    assert_eq!(*order.borrow(), vec!["B", "A"]);
    s.pump(3.0).unwrap();
    assert_eq!(*order.borrow(), vec!["B", "A", "C"]);
}

/// S2 Priority: normal N at 0.0, high H at 0.5, both due by `pump(1.0)`.
/// The first pump fires only H (short-circuit); the second fires N.
#[test]
fn s2_priority_high_fires_before_normal_across_separate_pumps() {
    let (s, _clock) = scheduler_with_clock(0.0, 500);
    let order = Rc::new(RefCell::new(Vec::new()));

    s.schedule_normal(
        "N".to_string(),
        0.0,
        CallbackId(1),
        recording_callback(&order, "N"),
        vec![],
    )
    .unwrap();
    s.schedule_high(
        "H".to_string(),
        0.5,
        CallbackId(2),
        recording_callback(&order, "H"),
        vec![],
    );

    s.pump(1.0).unwrap();
    assert_eq!(*order.borrow(), vec!["H"]);
    s.pump(1.0).unwrap();
    assert_eq!(*order.borrow(), vec!["H", "N"]);
}

/// S3 Cancellation: A(x,f), B(x,g), C(y,f). `cancel_matching(x,f)`
/// removes just A; `cancel_by_target(x)` then removes the remaining B;
/// `count_matching(y,f)` still reports C.
#[test]
fn s3_cancellation_matches_target_and_callback_independently() {
    let (s, _clock) = scheduler_with_clock(0.0, 500);
    let noop = |_t: &String, _a: &[Arg], _s: &SchedulerHandle<String>| {
        Ok(Box::new(()) as CallbackOutput)
    };

    let f = CallbackId(1);
    let g = CallbackId(2);

    s.schedule_normal("x".to_string(), 10.0, f, noop, vec![]).unwrap();
    s.schedule_normal("x".to_string(), 10.0, g, noop, vec![]).unwrap();
    s.schedule_normal("y".to_string(), 10.0, f, noop, vec![]).unwrap();

    assert_eq!(s.cancel_matching(&"x".to_string(), f), 1);
    assert_eq!(s.cancel_by_target(&"x".to_string()), 1);
    assert_eq!(s.count_matching(&"y".to_string(), f), 1);
}

/// S4 Reentrancy: a normal callback that recursively calls `pump` must
/// not cause a second normal record to fire within the same outer pass,
/// and the outer pump must still complete normally afterward.
#[test]
fn s4_reentrant_pump_does_not_starve_or_double_fire() {
    let (s, _clock) = scheduler_with_clock(0.0, 500);
    let fired = Rc::new(RefCell::new(Vec::new()));

    let inner_handle = s.clone();
    let fired_outer = Rc::clone(&fired);
    s.schedule_normal(
        "first".to_string(),
        1.0,
        CallbackId(1),
        move |_t: &String, _a: &[Arg], _s: &SchedulerHandle<String>| {
            fired_outer.borrow_mut().push("first");
            // Re-enter pump while the normal queue is still marked
            // running for this pass; nothing further should fire.
            inner_handle.pump(1.0).unwrap();
            Ok(Box::new(()) as CallbackOutput)
        },
        vec![],
    )
    .unwrap();
    s.schedule_normal(
        "second".to_string(),
        1.0,
        CallbackId(1),
        recording_callback(&fired, "second"),
        vec![],
    )
    .unwrap();

    s.pump(1.0).unwrap();
    assert_eq!(*fired.borrow(), vec!["first"]);

    s.pump(1.0).unwrap();
    assert_eq!(*fired.borrow(), vec!["first", "second"]);
}

/// S5 Skew: A scheduled at t=10.0 while the clock reads 5.0. After
/// `adjust_all(-3.0)`, `time_until_next()` at clock=5.0 is 2.0 (the
/// shifted fire time, 7.0, minus now).
#[test]
fn s5_skew_adjustment_shifts_time_until_next() {
    let (s, _clock) = scheduler_with_clock(5.0, 500);
    s.schedule_normal(
        "A".to_string(),
        10.0,
        CallbackId(1),
        |_t: &String, _a: &[Arg], _s: &SchedulerHandle<String>| Ok(Box::new(()) as CallbackOutput),
        vec![],
    )
    .unwrap();

    s.adjust_all(-3.0);
    let remaining = s.time_until_next(5.0).unwrap();
    assert!((remaining.as_secs_f64() - 2.0).abs() < 1e-9);
}

/// S6 Overflow: 500 normal records succeed against a cap of 500; the
/// 501st fails with `QueueOverflow` and inserts nothing, leaving the
/// queue's sorted invariant (and length) unchanged.
#[test]
fn s6_overflow_rejects_past_cap_without_mutating_queue() {
    let (s, _clock) = scheduler_with_clock(0.0, 500);
    let noop = |_t: &String, _a: &[Arg], _s: &SchedulerHandle<String>| {
        Ok(Box::new(()) as CallbackOutput)
    };

    for i in 0..500 {
        s.schedule_normal(format!("t{i}"), 1000.0 + i as f64, CallbackId(1), noop, vec![])
            .unwrap();
    }
    assert_eq!(s.list_pending().len(), 500);

    let err = s
        .schedule_normal("overflow".to_string(), 2000.0, CallbackId(1), noop, vec![])
        .unwrap_err();
    assert!(matches!(
        err,
        phosphor_scheduler::SchedulerError::QueueOverflow { len: 500, limit: 500 }
    ));
    assert_eq!(s.list_pending().len(), 500);
}
