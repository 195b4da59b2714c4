//! Cooperative timing primitives.
//!
//! Nothing in the tick may block, so every periodic action is gated on
//! "has `period` elapsed since it last ran". [`Interval`] is one such gate and
//! [`Scheduler`] is a fixed table of them keyed by task id.
//!
//! Firing always rebases on the current time: after a stall a task runs once,
//! not once per missed period.

use heapless::Vec;

// =============================================================================
// Interval
// =============================================================================

/// One periodic gate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Interval {
    period_ms: u64,
    last_ms: Option<u64>,
}

impl Interval {
    /// Gate that is due immediately, then every `period_ms`.
    pub const fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: None,
        }
    }

    /// Gate whose first period starts at `now_ms`.
    pub const fn starting_at(
        period_ms: u64,
        now_ms: u64,
    ) -> Self {
        Self {
            period_ms,
            last_ms: Some(now_ms),
        }
    }

    /// Change the period without touching the last-run time.
    #[inline]
    pub const fn set_period(
        &mut self,
        period_ms: u64,
    ) {
        self.period_ms = period_ms;
    }

    /// True once the period has elapsed (or the gate never ran).
    pub const fn is_due(
        &self,
        now_ms: u64,
    ) -> bool {
        match self.last_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.period_ms,
            None => true,
        }
    }

    /// If due, mark as run at `now_ms` and return true.
    pub const fn fire(
        &mut self,
        now_ms: u64,
    ) -> bool {
        if self.is_due(now_ms) {
            self.last_ms = Some(now_ms);
            true
        } else {
            false
        }
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Fixed table of `(task, interval)` entries ticked by the main loop.
pub struct Scheduler<T, const N: usize> {
    entries: Vec<(T, Interval), N>,
}

impl<T: Copy + Eq, const N: usize> Scheduler<T, N> {
    pub const fn new() -> Self { Self { entries: Vec::new() } }

    /// Register a task. Returns the task back if the table is full.
    pub fn add(
        &mut self,
        task: T,
        interval: Interval,
    ) -> Result<(), T> {
        self.entries.push((task, interval)).map_err(|(task, _)| task)
    }

    fn entry(
        &mut self,
        task: T,
    ) -> Option<&mut Interval> {
        self.entries.iter_mut().find(|(t, _)| *t == task).map(|(_, interval)| interval)
    }

    /// Fire every due task whose precondition holds, returning them in
    /// registration order. A task that is due but not `ready` keeps its
    /// period open and fires as soon as it becomes ready.
    pub fn due(
        &mut self,
        now_ms: u64,
        ready: impl Fn(T) -> bool,
    ) -> Vec<T, N> {
        let mut fired = Vec::new();
        for (task, interval) in self.entries.iter_mut() {
            if ready(*task) && interval.fire(now_ms) {
                fired.push(*task).ok();
            }
        }
        fired
    }

    /// Adjust a task's period (e.g. after a config change).
    pub fn set_period(
        &mut self,
        task: T,
        period_ms: u64,
    ) {
        if let Some(interval) = self.entry(task) {
            interval.set_period(period_ms);
        }
    }
}

impl<T: Copy + Eq, const N: usize> Default for Scheduler<T, N> {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    enum Task {
        Fast,
        Slow,
    }

    #[test]
    fn test_new_interval_is_due_immediately() {
        let mut i = Interval::new(1000);
        assert!(i.fire(0));
        assert!(!i.fire(999));
        assert!(i.fire(1000));
    }

    #[test]
    fn test_starting_at_waits_one_period() {
        let mut i = Interval::starting_at(1000, 500);
        assert!(!i.fire(1499));
        assert!(i.fire(1500));
    }

    #[test]
    fn test_stall_does_not_accumulate_backlog() {
        let mut i = Interval::new(100);
        assert!(i.fire(0));
        // Loop stalled for ten periods.
        assert!(i.fire(1000));
        assert!(!i.fire(1050));
        assert!(i.fire(1100));
    }

    #[test]
    fn test_calling_more_often_is_a_no_op() {
        let mut i = Interval::new(100);
        let fired = (0..100u64).filter(|t| i.fire(*t)).count();
        assert_eq!(fired, 1);
    }

    fn always(_: Task) -> bool { true }

    #[test]
    fn test_scheduler_due_in_registration_order() {
        let mut s: Scheduler<Task, 4> = Scheduler::new();
        s.add(Task::Fast, Interval::new(10)).unwrap();
        s.add(Task::Slow, Interval::new(100)).unwrap();
        assert_eq!(s.due(0, always).as_slice(), &[Task::Fast, Task::Slow]);
        assert_eq!(s.due(10, always).as_slice(), &[Task::Fast]);
        assert!(s.due(15, always).is_empty());
        assert_eq!(s.due(100, always).as_slice(), &[Task::Fast, Task::Slow]);
    }

    #[test]
    fn test_scheduler_waits_for_precondition() {
        let mut s: Scheduler<Task, 2> = Scheduler::new();
        s.add(Task::Slow, Interval::new(100)).unwrap();
        assert!(s.due(0, |_| false).is_empty());
        assert!(s.due(50, |_| false).is_empty());
        // Fires the moment it becomes ready, then waits a full period.
        assert_eq!(s.due(60, always).as_slice(), &[Task::Slow]);
        assert!(s.due(150, always).is_empty());
        assert_eq!(s.due(160, always).as_slice(), &[Task::Slow]);
    }

    #[test]
    fn test_scheduler_full() {
        let mut s: Scheduler<Task, 1> = Scheduler::new();
        s.add(Task::Fast, Interval::new(10)).unwrap();
        assert_eq!(s.add(Task::Slow, Interval::new(10)), Err(Task::Slow));
    }

    #[test]
    fn test_scheduler_set_period() {
        let mut s: Scheduler<Task, 2> = Scheduler::new();
        s.add(Task::Slow, Interval::new(100)).unwrap();
        assert_eq!(s.due(0, always).as_slice(), &[Task::Slow]);
        s.set_period(Task::Slow, 50);
        assert!(s.due(49, always).is_empty());
        assert_eq!(s.due(50, always).as_slice(), &[Task::Slow]);
        // Unknown tasks are ignored.
        s.set_period(Task::Fast, 1);
        assert_eq!(s.due(60, always).len(), 0);
    }
}
