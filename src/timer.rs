use log::trace;
use std::time::{Duration, Instant};

/// Identifies a scheduled timer, so it can be canceled later. Intentionally
/// not Copy/Clone: canceling consumes the handle, so a handle can't be used
/// after its timer is gone.
#[derive(Debug, Eq, PartialEq)]
pub struct TimerHandle(u64);

/// A set of one-shot timers, each carrying a payload to hand back when it
/// fires. Time only moves when the owner calls [TimerQueue::fire_due] with
/// the current instant, so nothing fires behind the owner's back.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    pending: Vec<Timer<T>>,
}

#[derive(Debug)]
struct Timer<T> {
    id: u64,
    deadline: Instant,
    payload: T,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Schedule a payload to fire `delay` after `now`
    pub fn schedule(
        &mut self,
        now: Instant,
        delay: Duration,
        payload: T,
    ) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(Timer {
            id,
            deadline: now + delay,
            payload,
        });
        trace!("Scheduled timer {id} in {delay:?}");
        TimerHandle(id)
    }

    /// Cancel a timer. Return whether it was still pending
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.id != handle.0);
        let canceled = self.pending.len() < before;
        if canceled {
            trace!("Canceled timer {}", handle.0);
        }
        canceled
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every timer whose deadline has passed, in deadline
    /// order. Timers with the same deadline fire in the order they were
    /// scheduled.
    pub fn fire_due(&mut self, now: Instant) -> Vec<(TimerHandle, T)> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|timer| timer.deadline <= now);
        self.pending = pending;
        due.sort_by_key(|timer| (timer.deadline, timer.id));
        due.into_iter()
            .map(|timer| {
                trace!("Timer {} fired", timer.id);
                (TimerHandle(timer.id), timer.payload)
            })
            .collect()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
