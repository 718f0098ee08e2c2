//! Interval scheduler: one timer per owner, fired from the event loop.
//!
//! Time is supplied by the caller in milliseconds, so the scheduler is fully
//! deterministic under test. Timer ids are never reused: once cancelled, an
//! id stays dead even if its owner is rescheduled.

use std::collections::HashMap;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Drives the active content source.
    Tick,
    /// Rotates a tile to its next content source.
    Cycle,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerOwner {
    pub tile: usize,
    pub kind: TimerKind,
}


impl TimerOwner {
    pub fn tick(tile: usize) -> Self {
        TimerOwner { tile, kind: TimerKind::Tick }
    }

    pub fn cycle(tile: usize) -> Self {
        TimerOwner { tile, kind: TimerKind::Cycle }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);


/// A timer that came due in one `fire_due` batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub owner: TimerOwner,
    /// Milliseconds since this timer last fired (or was scheduled).
    pub elapsed_ms: u64,
}


struct Timer {
    id: TimerId,
    interval_ms: u64,
    last_fired_ms: u64,
    next_due_ms: u64,
}


pub struct Scheduler {
    next_id: u64,
    timers: HashMap<TimerOwner, Timer>,
}


impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}


impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            next_id: 1,
            timers: HashMap::new(),
        }
    }

    /// Start an interval timer for `owner`, replacing any timer it already
    /// has. The first firing is one interval after `now_ms`.
    pub fn schedule(&mut self, owner: TimerOwner, interval_ms: u64, now_ms: u64) -> TimerId {
        let interval_ms = interval_ms.max(1);
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let previous = self.timers.insert(
            owner,
            Timer {
                id,
                interval_ms,
                last_fired_ms: now_ms,
                next_due_ms: now_ms.saturating_add(interval_ms),
            },
        );
        if previous.is_some() {
            tracing::debug!(?owner, "replaced timer");
        }
        id
    }

    /// Cancel a timer by id. Returns false if it was not live.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let owner = self
            .timers
            .iter()
            .find_map(|(owner, t)| (t.id == id).then_some(*owner));
        match owner {
            Some(owner) => self.timers.remove(&owner).is_some(),
            None => false,
        }
    }

    /// Cancel every timer. Returns how many were live.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        count
    }

    pub fn is_live(&self, id: TimerId) -> bool {
        self.timers.values().any(|t| t.id == id)
    }

    pub fn timer_for(&self, owner: TimerOwner) -> Option<TimerId> {
        self.timers.get(&owner).map(|t| t.id)
    }

    pub fn live_count(&self) -> usize {
        self.timers.len()
    }

    /// Collect every timer due at `now_ms`, ordered by due time then id, and
    /// reschedule them.
    ///
    /// A timer that fell more than one interval behind fires once and is
    /// rescheduled from `now_ms`. Callers must check `is_live` before
    /// dispatching each event: handling one event may cancel a timer that is
    /// later in the same batch.
    pub fn fire_due(&mut self, now_ms: u64) -> Vec<Fired> {
        let mut due: Vec<(u64, TimerId, TimerOwner)> = self
            .timers
            .iter()
            .filter(|(_, t)| t.next_due_ms <= now_ms)
            .map(|(owner, t)| (t.next_due_ms, t.id, *owner))
            .collect();
        due.sort();

        due.into_iter()
            .filter_map(|(_, id, owner)| {
                let timer = self.timers.get_mut(&owner)?;
                let elapsed_ms = now_ms.saturating_sub(timer.last_fired_ms);
                let next = timer.next_due_ms.saturating_add(timer.interval_ms);
                timer.next_due_ms = if next <= now_ms {
                    now_ms.saturating_add(timer.interval_ms)
                } else {
                    next
                };
                timer.last_fired_ms = now_ms;
                Some(Fired { id, owner, elapsed_ms })
            })
            .collect()
    }

    /// Earliest pending due time, for sizing the event loop's poll timeout.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.timers.values().map(|t| t.next_due_ms).min()
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_timer_is_not_immediately_due() {
        let mut s = Scheduler::new();
        s.schedule(TimerOwner::tick(0), 100, 1000);
        assert!(s.fire_due(1050).is_empty());
    }

    #[test]
    fn timer_fires_at_interval_boundary() {
        let mut s = Scheduler::new();
        let id = s.schedule(TimerOwner::tick(0), 100, 1000);
        let fired = s.fire_due(1100);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].id, id);
        assert_eq!(fired[0].elapsed_ms, 100);
        assert!(s.fire_due(1150).is_empty());
        assert_eq!(s.fire_due(1200).len(), 1);
    }

    #[test]
    fn late_timer_fires_once_and_restarts_from_now() {
        let mut s = Scheduler::new();
        s.schedule(TimerOwner::tick(0), 100, 0);
        // Ten intervals late: one firing, not ten.
        assert_eq!(s.fire_due(1000).len(), 1);
        assert!(s.fire_due(1050).is_empty());
        assert_eq!(s.next_due_ms(), Some(1100));
    }

    #[test]
    fn rescheduling_an_owner_replaces_its_timer() {
        let mut s = Scheduler::new();
        let first = s.schedule(TimerOwner::tick(3), 100, 0);
        let second = s.schedule(TimerOwner::tick(3), 200, 0);
        assert_ne!(first, second);
        assert!(!s.is_live(first));
        assert!(s.is_live(second));
        assert_eq!(s.live_count(), 1);
    }

    #[test]
    fn cancelled_id_stays_dead() {
        let mut s = Scheduler::new();
        let id = s.schedule(TimerOwner::cycle(1), 100, 0);
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        s.schedule(TimerOwner::cycle(1), 100, 0);
        assert!(!s.is_live(id));
    }

    #[test]
    fn batch_is_ordered_by_due_time() {
        let mut s = Scheduler::new();
        s.schedule(TimerOwner::tick(0), 300, 0);
        s.schedule(TimerOwner::tick(1), 100, 0);
        s.schedule(TimerOwner::cycle(0), 200, 0);
        let owners: Vec<TimerOwner> = s.fire_due(300).into_iter().map(|f| f.owner).collect();
        assert_eq!(
            owners,
            vec![TimerOwner::tick(1), TimerOwner::cycle(0), TimerOwner::tick(0)]
        );
    }

    #[test]
    fn cancel_all_reports_live_count() {
        let mut s = Scheduler::new();
        s.schedule(TimerOwner::tick(0), 100, 0);
        s.schedule(TimerOwner::cycle(0), 100, 0);
        assert_eq!(s.cancel_all(), 2);
        assert_eq!(s.cancel_all(), 0);
        assert_eq!(s.next_due_ms(), None);
    }
}
