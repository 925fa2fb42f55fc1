//! Ambulance animation state machine.
//!
//! Replaces the recursive frame-callback chain of a browser host with an
//! explicit tick-driven state machine: Idle → Running → Stopped. Each tick
//! advances an intra-segment step counter; the position is the linear
//! interpolation between the current segment's endpoints at
//! `step / steps_per_segment`. Reaching the end of the last segment
//! transitions to Stopped exactly once.
//!
//! Every `start` and `stop` bumps the [`RunId`]; clock events from an
//! earlier run are dropped by the systems, which makes cancellation atomic
//! with respect to in-flight classification events.

use bevy_ecs::prelude::Resource;
use h3o::LatLng;

use crate::clock::RunId;
use crate::routing::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorPhase {
    Idle,
    Running,
    Stopped,
}

/// Result of advancing the animator by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The ambulance moved to a new interpolated position.
    Moved(LatLng),
    /// The route is complete; the animator has transitioned to Stopped.
    Completed,
}

#[derive(Debug, Resource)]
pub struct Animator {
    phase: AnimatorPhase,
    route: Option<Route>,
    segment: usize,
    step: u32,
    steps_per_segment: u32,
    run: RunId,
}

impl Animator {
    pub fn new(steps_per_segment: u32) -> Self {
        Self {
            phase: AnimatorPhase::Idle,
            route: None,
            segment: 0,
            step: 0,
            steps_per_segment: steps_per_segment.max(1),
            run: RunId(0),
        }
    }

    pub fn phase(&self) -> AnimatorPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == AnimatorPhase::Running
    }

    /// Id of the current animation run. Events carrying any other id are
    /// leftovers from a cancelled or completed run.
    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// Begin a new run, placing the moving point at the route's first
    /// waypoint. Returns the new run id for scheduling.
    pub fn start(&mut self, route: Route) -> RunId {
        self.route = Some(route);
        self.segment = 0;
        self.step = 0;
        self.phase = AnimatorPhase::Running;
        self.run = RunId(self.run.0.wrapping_add(1));
        self.run
    }

    /// Halt the run and release the route. No-op unless Running.
    pub fn stop(&mut self) {
        if self.phase != AnimatorPhase::Running {
            return;
        }
        self.phase = AnimatorPhase::Stopped;
        self.route = None;
        self.segment = 0;
        self.step = 0;
        self.run = RunId(self.run.0.wrapping_add(1));
    }

    /// Current interpolated position, while Running.
    pub fn position(&self) -> Option<LatLng> {
        if self.phase != AnimatorPhase::Running {
            return None;
        }
        let route = self.route.as_ref()?;
        Some(self.position_at(route, self.segment, self.step))
    }

    /// Advance by one tick. Returns `None` unless Running.
    pub fn advance(&mut self) -> Option<TickOutcome> {
        if self.phase != AnimatorPhase::Running {
            return None;
        }
        let last_segment = self.route.as_ref()?.segment_count();

        self.step += 1;
        if self.step >= self.steps_per_segment {
            self.segment += 1;
            self.step = 0;
            if self.segment >= last_segment {
                self.phase = AnimatorPhase::Stopped;
                return Some(TickOutcome::Completed);
            }
        }

        let route = self.route.as_ref()?;
        Some(TickOutcome::Moved(self.position_at(
            route,
            self.segment,
            self.step,
        )))
    }

    fn position_at(&self, route: &Route, segment: usize, step: u32) -> LatLng {
        let points = route.points();
        let from = points[segment];
        let to = points[segment + 1];
        let t = f64::from(step) / f64::from(self.steps_per_segment);
        let lat = from.lat() + (to.lat() - from.lat()) * t;
        let lng = from.lng() + (to.lng() - from.lng()) * t;
        LatLng::new(lat, lng).expect("interpolation stays within valid coordinates")
    }
}
