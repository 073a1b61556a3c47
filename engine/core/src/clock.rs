//! Simulated Clock and Timer Queue
//!
//! Every delayed action in RetroBot (animation cleanups, the idle cycle,
//! delayed replies, auto-hide) is a typed event parked in a [`Scheduler`].
//! Nothing sleeps: the owner advances the clock explicitly, and due events
//! come back out strictly in timestamp order.
//!
//! # Design Philosophy
//!
//! - **Deterministic**: tests drive time by hand, surfaces drive it from a
//!   real clock. Both see identical ordering.
//! - **Cancellable**: a cancelled timer is removed from the queue, so it can
//!   never fire later.
//! - **Stable**: timers due at the same instant fire in the order they were
//!   scheduled.
//!
//! ```text
//!   schedule(300, Reply)        schedule(500, Cleanup)
//!          │                            │
//!          ▼                            ▼
//!   ┌──────────────────────────────────────────┐
//!   │ (300, #1) Reply │ (500, #2) Cleanup │ ... │   BTreeMap ordered by (due, id)
//!   └──────────────────────────────────────────┘
//!          │
//!   pop_due(until) ──► now_ms = 300, yields Reply
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle for a scheduled timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

impl TimerId {
    /// Raw numeric value
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Timer queue over simulated milliseconds
///
/// `E` is the event type delivered when a timer fires. The scheduler never
/// interprets events; it only orders them.
#[derive(Debug)]
pub struct Scheduler<E> {
    now_ms: u64,
    next_id: u64,
    queue: BTreeMap<(u64, TimerId), E>,
    due_index: HashMap<TimerId, u64>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    /// Create an empty scheduler at t = 0
    #[must_use]
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            queue: BTreeMap::new(),
            due_index: HashMap::new(),
        }
    }

    /// Current simulated time in milliseconds
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `event` to fire `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: u64, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        let due = self.now_ms.saturating_add(delay_ms);
        self.queue.insert((due, id), event);
        self.due_index.insert(id, due);
        id
    }

    /// Cancel a pending timer
    ///
    /// Returns `false` if the timer already fired or was never scheduled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_index.remove(&id) {
            Some(due) => self.queue.remove(&(due, id)).is_some(),
            None => false,
        }
    }

    /// Whether a timer is still pending
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_index.contains_key(&id)
    }

    /// Due time of the earliest pending timer
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Number of pending timers
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Pop the earliest timer due at or before `until_ms`
    ///
    /// The clock jumps to the fired timer's due time, so anything the caller
    /// schedules while handling the event is relative to that instant.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, E)> {
        let (&(due, id), _) = self.queue.iter().next()?;
        if due > until_ms {
            return None;
        }

        let event = self.queue.remove(&(due, id))?;
        self.due_index.remove(&id);
        self.now_ms = self.now_ms.max(due);
        Some((id, event))
    }

    /// Move the clock forward without firing anything
    ///
    /// Callers drain [`pop_due`](Self::pop_due) first; jumping past pending
    /// timers would make them fire late.
    pub fn advance_to(&mut self, ms: u64) {
        self.now_ms = self.now_ms.max(ms);
    }
}
