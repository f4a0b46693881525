//! `TimerQueue`: the ordered sequence behind one priority level.
//!
//! A `Scheduler` owns two of these, one per priority. The reentrancy
//! guard lives a level up in `scheduler.rs`, scoped to span a
//! callback invocation.

use crate::record::{CallbackId, TargetValue, TimerHandle, TimerRecord};

/// An ordered sequence of `TimerRecord`s, sorted ascending by
/// `fire_at`, plus a cached head timestamp and reentrancy flag.
pub struct TimerQueue<T> {
    records: Vec<TimerRecord<T>>,
    head_fire_at: Option<f64>,
    running: bool,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            head_fire_at: None,
            running: false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn head_fire_at(&self) -> Option<f64> {
        self.head_fire_at
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Mark the queue as being pumped. Returns `false` if it was
    /// already running.
    pub fn begin_run(&mut self) -> bool {
        if self.running {
            false
        } else {
            self.running = true;
            true
        }
    }

    /// Clear the reentrancy flag. Idempotent.
    pub fn end_run(&mut self) {
        self.running = false;
    }

    /// Insert `record`, keeping `records` sorted ascending by
    /// `fire_at` and preserving insertion order among ties.
    pub fn insert(&mut self, record: TimerRecord<T>) {
        let pos = self
            .records
            .iter()
            .position(|r| r.fire_at > record.fire_at)
            .unwrap_or(self.records.len());
        self.records.insert(pos, record);
        self.refresh_head();
    }

    /// Remove and return the head record if it is due (`fire_at <= now`).
    pub fn pop_due(&mut self, now: f64) -> Option<TimerRecord<T>> {
        if self.head_fire_at.map(|t| t <= now).unwrap_or(false) {
            let record = self.records.remove(0);
            self.refresh_head();
            Some(record)
        } else {
            None
        }
    }

    /// Remove every record whose `target`/`callback_id` match both
    /// given values. Returns the removed records.
    pub fn remove_matching(
        &mut self,
        target: &dyn TargetValue,
        callback_id: CallbackId,
    ) -> Vec<TimerRecord<T>>
    where
        T: TargetValue,
    {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.records.len() {
            let matches = self.records[i].callback_id == callback_id
                && self.records[i].target.eq_target(target);
            if matches {
                removed.push(self.records.remove(i));
            } else {
                i += 1;
            }
        }
        if !removed.is_empty() {
            self.refresh_head();
        }
        removed
    }

    /// Remove at most one record matching both criteria. Returns it
    /// if found.
    pub fn remove_one_matching(
        &mut self,
        target: &dyn TargetValue,
        callback_id: CallbackId,
    ) -> Option<TimerRecord<T>>
    where
        T: TargetValue,
    {
        let pos = self
            .records
            .iter()
            .position(|r| r.callback_id == callback_id && r.target.eq_target(target))?;
        let record = self.records.remove(pos);
        self.refresh_head();
        Some(record)
    }

    /// Remove every record whose `target` matches, irrespective of
    /// callback identity.
    pub fn remove_by_target(&mut self, target: &dyn TargetValue) -> usize
    where
        T: TargetValue,
    {
        let before = self.records.len();
        self.records.retain(|r| !r.target.eq_target(target));
        let removed = before - self.records.len();
        if removed > 0 {
            self.refresh_head();
        }
        removed
    }

    /// Remove the record named by `handle`, if present.
    pub fn remove_specific(&mut self, handle: TimerHandle) -> Option<TimerRecord<T>> {
        let pos = self.records.iter().position(|r| r.handle == handle)?;
        let record = self.records.remove(pos);
        self.refresh_head();
        Some(record)
    }

    pub fn count_matching(&self, target: &dyn TargetValue, callback_id: CallbackId) -> usize
    where
        T: TargetValue,
    {
        self.records
            .iter()
            .filter(|r| r.callback_id == callback_id && r.target.eq_target(target))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimerRecord<T>> {
        self.records.iter()
    }

    /// Add `delta` to every pending record's `fire_at`. Sort
    /// order is preserved because the shift is uniform.
    pub fn shift_all(&mut self, delta: f64) {
        for record in &mut self.records {
            record.fire_at += delta;
        }
        self.refresh_head();
    }

    fn refresh_head(&mut self) {
        self.head_fire_at = self.records.first().map(|r| r.fire_at);
    }
}
