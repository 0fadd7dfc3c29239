// core/scheduler.rs
//
// Single cooperative timer queue. Events are data, not closures: whoever
// drains the queue decides what an event means. Drained once per tick, so
// delayed work is ordered deterministically relative to physics and rendering.
//
// Usage:
//   let mut timers = Scheduler::new();
//   let h = timers.schedule(now, 0.3, MyEvent::Fire);
//   while let Some((_, ev)) = timers.pop_due(now) { ... }

use std::collections::{BTreeMap, HashMap};

/// Handle to a scheduled event, for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Time-ordered queue of pending events.
///
/// Events due at the same instant pop in scheduling order.
#[derive(Debug)]
pub struct Scheduler<E> {
    /// (due time in microseconds, sequence number) -> event
    queue: BTreeMap<(u64, u64), E>,
    /// sequence number -> due time, for cancellation
    due_by_seq: HashMap<u64, u64>,
    next_seq: u64,
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            due_by_seq: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `event` to become due `delay` seconds after `now`.
    pub fn schedule(&mut self, now: f64, delay: f64, event: E) -> TimerHandle {
        let due = to_micros(now + delay.max(0.0));
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((due, seq), event);
        self.due_by_seq.insert(seq, due);
        TimerHandle(seq)
    }

    /// Cancel a pending event. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.due_by_seq.remove(&handle.0) {
            Some(due) => self.queue.remove(&(due, handle.0)).is_some(),
            None => false,
        }
    }

    /// Pop the earliest event that is due at `now`, if any.
    pub fn pop_due(&mut self, now: f64) -> Option<(TimerHandle, E)> {
        let now_us = to_micros(now);
        let (&(due, seq), _) = self.queue.first_key_value()?;
        if due > now_us {
            return None;
        }
        let event = self.queue.remove(&(due, seq))?;
        self.due_by_seq.remove(&seq);
        Some((TimerHandle(seq), event))
    }

    /// Due time of the earliest pending event, in seconds.
    pub fn next_due(&self) -> Option<f64> {
        self.queue.keys().next().map(|&(due, _)| due as f64 / 1e6)
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.due_by_seq.contains_key(&handle.0)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.due_by_seq.clear();
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn to_micros(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1e6).round() as u64
}
