use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use uuid::Uuid;

use crate::model::SelectionOrigin;

/// Cancel handle for an armed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Work a timer performs when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Settle the pending change with the given id.
    SettleChange(Uuid),
    /// Read the host selection, tagged with an origin when one was requested.
    PollSelection(Option<SelectionOrigin>),
}

/// A deterministic queue of scheduled tasks driven by an explicit clock.
///
/// Tasks never fire on their own: the owner advances the clock and pops
/// whatever became due. Tasks due at the same instant fire in the order
/// they were armed.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, TimerHandle), TimerTask>,
    deadlines: HashMap<TimerHandle, Duration>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on this queue's clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn arm(&mut self, delay: Duration, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        let deadline = self.now + delay;
        self.queue.insert((deadline, handle), task);
        self.deadlines.insert(handle, deadline);
        log::trace!("armed {:?} for {:?} at {:?}", task, handle, deadline);
        handle
    }

    /// Cancel an armed task. Returns false when it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.deadlines.remove(&handle) {
            Some(deadline) => self.queue.remove(&(deadline, handle)).is_some(),
            None => false,
        }
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Remove and return the earliest task due at or before `until`,
    /// moving the clock to its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerHandle, TimerTask)> {
        let (&(deadline, handle), _) = self.queue.first_key_value()?;
        if deadline > until {
            return None;
        }
        let task = self.queue.remove(&(deadline, handle))?;
        self.deadlines.remove(&handle);
        self.now = self.now.max(deadline);
        Some((handle, task))
    }

    /// Move the clock forward without firing anything.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}
