//! Output events for the rendering collaborator, plus aggregate counters.
//!
//! The engine never touches rendering primitives; everything the excluded
//! map/toast layer needs arrives through [`SimEvent`] values queued in the
//! [`SimEvents`] resource and drained by the host after each step.

use std::collections::VecDeque;

use bevy_ecs::prelude::Resource;
use h3o::LatLng;

use crate::proximity::AlertStates;
use crate::routing::Route;

/// User-visible message when route generation fails (the rendering layer
/// shows it verbatim).
pub const ROUTE_FAILED_MESSAGE: &str = "Failed to generate route. Please try again.";

/// User-visible message when the distance-matrix tier fails and the
/// great-circle fallback takes over.
pub const DEGRADED_ALERTS_MESSAGE: &str =
    "Failed to update vehicle alerts. Using approximate method.";

/// One output event consumed by the rendering collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A route was generated and the population reseeded.
    RouteReady(Route),
    /// The ambulance moved.
    PositionUpdate(LatLng),
    /// Full replacement of every vehicle's alert flag.
    AlertStateChanged(AlertStates),
    /// Non-fatal degraded-mode notice (fallback classification in use).
    Degraded(String),
    /// Fatal error for the current simulation attempt.
    Error(String),
}

/// FIFO queue of pending output events.
#[derive(Debug, Default, Resource)]
pub struct SimEvents {
    queue: VecDeque<SimEvent>,
}

impl SimEvents {
    pub fn push(&mut self, event: SimEvent) {
        self.queue.push_back(event);
    }

    /// Remove and return every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Aggregate counters for one controller lifetime.
#[derive(Debug, Default, Clone, Copy, Resource)]
pub struct SimTelemetry {
    /// Move steps processed.
    pub ticks: u64,
    /// Classification passes run.
    pub classifications: u64,
    /// Classification passes that fell back to great-circle distances.
    pub degraded_classifications: u64,
    /// Animation runs that reached the end of their route.
    pub completed_runs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_drain_in_fifo_order() {
        let mut events = SimEvents::default();
        events.push(SimEvent::Degraded("first".to_string()));
        events.push(SimEvent::Error("second".to_string()));
        assert_eq!(events.len(), 2);

        let drained = events.drain();
        assert_eq!(
            drained,
            vec![
                SimEvent::Degraded("first".to_string()),
                SimEvent::Error("second".to_string()),
            ]
        );
        assert!(events.is_empty());
    }
}
