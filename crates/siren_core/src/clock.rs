//! Discrete-event simulation clock.
//!
//! Events are popped strictly in timestamp order, one at a time, so a tick's
//! alert-state mutation always completes before the next tick begins. Every
//! event carries the [`RunId`] of the animation run that scheduled it;
//! systems drop events whose run id no longer matches the current run, which
//! keeps a cancelled run's leftover events from mutating state.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::Resource;

/// Identifies one animation run. Bumped on every start and stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    SimulationStarted,
    MoveStep,
    UpdateAlerts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    pub kind: EventKind,
    pub run: RunId,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by timestamp.
        // At equal timestamps the later-declared kind wins, so an alert
        // pass scheduled for "now" runs before a same-time move step.
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.run.0.cmp(&other.run.0))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The event currently being processed by the schedule.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

/// Simulation milliseconds between two move steps.
#[derive(Debug, Clone, Copy, Resource)]
pub struct TickInterval(pub u64);

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: u64,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn schedule(&mut self, event: Event) {
        debug_assert!(
            event.timestamp >= self.now,
            "event timestamp must be >= current time"
        );
        self.events.push(event);
    }

    pub fn schedule_at(&mut self, timestamp: u64, kind: EventKind, run: RunId) {
        self.schedule(Event {
            timestamp,
            kind,
            run,
        });
    }

    pub fn schedule_in(&mut self, delay_ms: u64, kind: EventKind, run: RunId) {
        self.schedule_at(self.now + delay_ms, kind, run);
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.timestamp;
        Some(event)
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.events.peek().map(|event| event.timestamp)
    }

    pub fn pending_event_count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Discard every pending event. The current time is kept so a later run
    /// keeps scheduling monotonically.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_pops_events_in_time_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(10, EventKind::MoveStep, RunId(1));
        clock.schedule_at(5, EventKind::MoveStep, RunId(1));
        clock.schedule_at(20, EventKind::MoveStep, RunId(1));

        let first = clock.pop_next().expect("first event");
        assert_eq!(first.timestamp, 5);
        assert_eq!(clock.now(), 5);

        let second = clock.pop_next().expect("second event");
        assert_eq!(second.timestamp, 10);

        let third = clock.pop_next().expect("third event");
        assert_eq!(third.timestamp, 20);

        assert!(clock.pop_next().is_none());
        assert!(clock.is_empty());
    }

    #[test]
    fn alert_pass_runs_before_a_same_time_move_step() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(5, EventKind::MoveStep, RunId(1));
        clock.schedule_at(5, EventKind::UpdateAlerts, RunId(1));

        let first = clock.pop_next().expect("first event");
        assert_eq!(first.kind, EventKind::UpdateAlerts);

        let second = clock.pop_next().expect("second event");
        assert_eq!(second.kind, EventKind::MoveStep);
    }

    #[test]
    fn clear_discards_pending_events_but_keeps_time() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(5, EventKind::MoveStep, RunId(1));
        clock.pop_next().expect("event");
        clock.schedule_at(30, EventKind::MoveStep, RunId(1));

        clock.clear();

        assert!(clock.is_empty());
        assert_eq!(clock.now(), 5);
        assert_eq!(clock.pending_event_count(), 0);
    }
}
