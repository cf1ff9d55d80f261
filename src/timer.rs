//! Repeating timers for the single-threaded UI loop.
//!
//! Timers carry no callback of their own: the owner polls [`TimerQueue::due`]
//! and runs its tick for every id returned, then re-arms or cancels it based on
//! the [`Control`] the tick produced.

use std::time::{Duration, Instant};

/// Result of a timer callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Re-arm the timer for another interval.
    Continue,
    /// Cancel the timer.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer {
    id: TimerId,
    interval: Duration,
    next_due: Instant,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a repeating timer firing every `interval`, first at `now + interval`.
    pub fn schedule_repeating(&mut self, interval: Duration, now: Instant) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            interval,
            next_due: now + interval,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id);
    }

    /// Ids of timers whose deadline has passed, oldest first.
    pub fn due(&self, now: Instant) -> Vec<TimerId> {
        self.timers
            .iter()
            .filter(|t| t.next_due <= now)
            .map(|t| t.id)
            .collect()
    }

    /// Apply a callback result: re-arm relative to `now` or drop the timer.
    pub fn settle(&mut self, id: TimerId, control: Control, now: Instant) {
        match control {
            Control::Stop => self.cancel(id),
            Control::Continue => {
                if let Some(timer) = self.timers.iter_mut().find(|t| t.id == id) {
                    timer.next_due = now + timer.interval;
                }
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|t| t.next_due).min()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
