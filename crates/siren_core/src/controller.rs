//! Simulation orchestration: route generation → population seeding →
//! animator lifecycle.
//!
//! The controller is the only piece the host drives directly. Setup
//! failures (route generation, endpoint validation) are fatal to the
//! attempt and surface as [`SimEvent::Error`]; per-tick classification
//! failures never reach here, the classifier recovers them locally.

use std::fmt;

use bevy_ecs::prelude::{Schedule, World};
use h3o::LatLng;
use rand::rngs::StdRng;

use crate::animator::Animator;
use crate::clock::{EventKind, SimulationClock};
use crate::ecs::Vehicle;
use crate::population::seed_vehicles;
use crate::proximity::AlertStates;
use crate::routing::{build_route_source, Route, RouteError, RouteSource};
use crate::runner::{run_next_event, run_until_idle, simulation_schedule};
use crate::scenario::{build_rng, build_world, SimulationParams};
use crate::telemetry::{SimEvent, SimEvents, SimTelemetry, ROUTE_FAILED_MESSAGE};

/// Fatal errors for one simulation attempt.
#[derive(Debug)]
pub enum SimulationError {
    /// Endpoints coincide or lie outside the configured bounds.
    InvalidEndpoints,
    /// The routing backend produced no usable route.
    RouteUnavailable(RouteError),
    /// `start` was called before a route was generated.
    NoRouteLoaded,
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InvalidEndpoints => {
                write!(
                    f,
                    "Invalid route endpoints. Choose two distinct points inside the map bounds."
                )
            }
            SimulationError::RouteUnavailable(_) => write!(f, "{}", ROUTE_FAILED_MESSAGE),
            SimulationError::NoRouteLoaded => {
                write!(
                    f,
                    "No route loaded. Generate a route before starting the simulation."
                )
            }
        }
    }
}

impl std::error::Error for SimulationError {}

impl From<RouteError> for SimulationError {
    fn from(err: RouteError) -> Self {
        SimulationError::RouteUnavailable(err)
    }
}

pub struct SimulationController {
    world: World,
    schedule: Schedule,
    route_source: Box<dyn RouteSource>,
    rng: StdRng,
    params: SimulationParams,
    route: Option<Route>,
}

impl SimulationController {
    pub fn new(params: SimulationParams) -> Self {
        let route_source = build_route_source(&params.route_source);
        Self::with_route_source(params, route_source)
    }

    /// Controller with an injected route source (tests, custom hosts).
    pub fn with_route_source(
        params: SimulationParams,
        route_source: Box<dyn RouteSource>,
    ) -> Self {
        let world = build_world(&params);
        let schedule = simulation_schedule();
        let rng = build_rng(params.seed);
        Self {
            world,
            schedule,
            route_source,
            rng,
            params,
            route: None,
        }
    }

    /// Generate a route between two random points in the configured bounds
    /// and reseed the vehicle population along it.
    pub fn generate_route(&mut self) -> Result<(), SimulationError> {
        let start = self.params.bounds.random_point(&mut self.rng);
        let end = self.params.bounds.random_point(&mut self.rng);
        self.generate_route_between(start, end)
    }

    /// Generate a route between explicit endpoints.
    pub fn generate_route_between(
        &mut self,
        start: LatLng,
        end: LatLng,
    ) -> Result<(), SimulationError> {
        if start == end
            || !self.params.bounds.contains(start)
            || !self.params.bounds.contains(end)
        {
            return Err(self.report(SimulationError::InvalidEndpoints));
        }

        let route = match self.route_source.route(start, end) {
            Ok(route) => route,
            Err(err) => return Err(self.report(SimulationError::RouteUnavailable(err))),
        };
        log::info!("generated route with {} waypoints", route.waypoint_count());

        seed_vehicles(
            &mut self.world,
            &route,
            &self.params.bounds,
            self.params.vehicle_count,
            self.params.on_route_fraction,
            &mut self.rng,
        );
        self.push_event(SimEvent::RouteReady(route.clone()));
        self.route = Some(route);
        Ok(())
    }

    /// Start animating the current route. Ignored while already running.
    pub fn start(&mut self) -> Result<(), SimulationError> {
        if self.is_running() {
            return Ok(());
        }
        let Some(route) = self.route.clone() else {
            return Err(self.report(SimulationError::NoRouteLoaded));
        };

        let run = self.world.resource_mut::<Animator>().start(route);
        let mut clock = self.world.resource_mut::<SimulationClock>();
        let now = clock.now();
        clock.schedule_at(now, EventKind::SimulationStarted, run);
        Ok(())
    }

    /// Halt the run: discard every pending event (including any queued
    /// classification) and clear all alert flags. Idempotent.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.world.resource_mut::<SimulationClock>().clear();
        self.world.resource_mut::<Animator>().stop();
        let cleared = self.reset_alerts();
        self.push_event(SimEvent::AlertStateChanged(cleared));
    }

    /// Process the next clock event. Returns `false` once idle.
    pub fn step(&mut self) -> bool {
        run_next_event(&mut self.world, &mut self.schedule)
    }

    /// Process events until idle or `max_steps`. Returns steps executed.
    pub fn run_to_completion(&mut self, max_steps: usize) -> usize {
        run_until_idle(&mut self.world, &mut self.schedule, max_steps)
    }

    /// Remove and return the pending output events, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.world.resource_mut::<SimEvents>().drain()
    }

    pub fn is_running(&self) -> bool {
        self.world.resource::<Animator>().is_running()
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn telemetry(&self) -> SimTelemetry {
        *self.world.resource::<SimTelemetry>()
    }

    /// Current alert flag per vehicle.
    pub fn alert_states(&mut self) -> AlertStates {
        let mut query = self.world.query::<&Vehicle>();
        query
            .iter(&self.world)
            .map(|vehicle| (vehicle.id, vehicle.alerted))
            .collect()
    }

    fn push_event(&mut self, event: SimEvent) {
        self.world.resource_mut::<SimEvents>().push(event);
    }

    fn report(&mut self, err: SimulationError) -> SimulationError {
        log::error!("simulation setup failed: {:?}", err);
        self.push_event(SimEvent::Error(err.to_string()));
        err
    }

    fn reset_alerts(&mut self) -> AlertStates {
        let mut cleared = AlertStates::new();
        let mut query = self.world.query::<&mut Vehicle>();
        for mut vehicle in query.iter_mut(&mut self.world) {
            vehicle.alerted = false;
            cleared.insert(vehicle.id, false);
        }
        cleared
    }
}
