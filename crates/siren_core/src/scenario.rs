//! Simulation parameters and world construction.

use bevy_ecs::prelude::World;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::animator::Animator;
use crate::clock::{SimulationClock, TickInterval};
use crate::geo::MapBounds;
#[cfg(feature = "ors")]
use crate::proximity::matrix::MatrixClient;
use crate::proximity::ProximityClassifier;
use crate::routing::RouteSourceKind;
use crate::telemetry::{SimEvents, SimTelemetry};

/// Default bounding box: Ahmedabad, India (approx city-center map view).
const DEFAULT_LAT_MIN: f64 = 22.96;
const DEFAULT_LAT_MAX: f64 = 23.08;
const DEFAULT_LNG_MIN: f64 = 72.55;
const DEFAULT_LNG_MAX: f64 = 72.72;

pub const DEFAULT_VEHICLE_COUNT: usize = 20;
pub const DEFAULT_ON_ROUTE_FRACTION: f64 = 0.5;
pub const DEFAULT_ALERT_RADIUS_KM: f64 = 10.0;
pub const DEFAULT_STEPS_PER_SEGMENT: u32 = 60;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

/// Public OpenRouteService endpoint, for hosts that wire up the live
/// directions and matrix services.
pub const OPENROUTESERVICE_ENDPOINT: &str = "https://api.openrouteservice.org";

/// Distance-matrix service configuration (endpoint + credential). Supplied
/// by the host; the engine reads no environment variables itself.
#[cfg(feature = "ors")]
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// Parameters for one simulation setup.
#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub vehicle_count: usize,
    /// Share of vehicles snapped onto the route (the rest scatter in bounds).
    pub on_route_fraction: f64,
    pub alert_radius_km: f64,
    /// Interpolation ticks per route segment.
    pub steps_per_segment: u32,
    /// Simulation milliseconds between move steps.
    pub tick_interval_ms: u64,
    /// Seed for the endpoint/population RNG (for reproducibility).
    pub seed: Option<u64>,
    /// Map area that endpoints and off-route vehicles are drawn from.
    pub bounds: MapBounds,
    /// Which routing backend generates the route.
    pub route_source: RouteSourceKind,
    /// Distance-matrix primary tier; `None` means great-circle only.
    #[cfg(feature = "ors")]
    pub matrix: Option<MatrixConfig>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            vehicle_count: DEFAULT_VEHICLE_COUNT,
            on_route_fraction: DEFAULT_ON_ROUTE_FRACTION,
            alert_radius_km: DEFAULT_ALERT_RADIUS_KM,
            steps_per_segment: DEFAULT_STEPS_PER_SEGMENT,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            seed: None,
            bounds: MapBounds::new(
                DEFAULT_LAT_MIN,
                DEFAULT_LAT_MAX,
                DEFAULT_LNG_MIN,
                DEFAULT_LNG_MAX,
            )
            .expect("default bounds are valid"),
            route_source: RouteSourceKind::default(),
            #[cfg(feature = "ors")]
            matrix: None,
        }
    }
}

impl SimulationParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_vehicle_count(mut self, count: usize) -> Self {
        self.vehicle_count = count;
        self
    }

    pub fn with_on_route_fraction(mut self, fraction: f64) -> Self {
        self.on_route_fraction = fraction;
        self
    }

    pub fn with_alert_radius_km(mut self, radius_km: f64) -> Self {
        self.alert_radius_km = radius_km;
        self
    }

    pub fn with_steps_per_segment(mut self, steps: u32) -> Self {
        self.steps_per_segment = steps;
        self
    }

    pub fn with_tick_interval_ms(mut self, interval_ms: u64) -> Self {
        self.tick_interval_ms = interval_ms;
        self
    }

    pub fn with_bounds(mut self, bounds: MapBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_route_source(mut self, route_source: RouteSourceKind) -> Self {
        self.route_source = route_source;
        self
    }

    #[cfg(feature = "ors")]
    pub fn with_matrix(mut self, matrix: MatrixConfig) -> Self {
        self.matrix = Some(matrix);
        self
    }
}

/// Build the RNG used for endpoint selection and population seeding.
pub fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(feature = "ors")]
fn build_classifier(params: &SimulationParams) -> ProximityClassifier {
    match &params.matrix {
        Some(matrix) => ProximityClassifier::with_primary(
            params.alert_radius_km,
            Box::new(MatrixClient::new(&matrix.endpoint, &matrix.api_key)),
        ),
        None => ProximityClassifier::new(params.alert_radius_km),
    }
}

#[cfg(not(feature = "ors"))]
fn build_classifier(params: &SimulationParams) -> ProximityClassifier {
    ProximityClassifier::new(params.alert_radius_km)
}

/// Create a world holding every engine resource. Vehicles are spawned later,
/// when a route exists to seed them along.
pub fn build_world(params: &SimulationParams) -> World {
    let mut world = World::new();
    world.insert_resource(SimulationClock::default());
    world.insert_resource(SimEvents::default());
    world.insert_resource(SimTelemetry::default());
    world.insert_resource(TickInterval(params.tick_interval_ms));
    world.insert_resource(Animator::new(params.steps_per_segment));
    world.insert_resource(build_classifier(params));
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use h3o::LatLng;

    #[test]
    fn default_params_match_the_reference_configuration() {
        let params = SimulationParams::default();

        assert_eq!(params.vehicle_count, 20);
        assert_eq!(params.on_route_fraction, 0.5);
        assert_eq!(params.alert_radius_km, 10.0);
        assert_eq!(params.steps_per_segment, 60);
        let center = LatLng::new(23.0225, 72.6369).expect("valid point");
        assert!(params.bounds.contains(center));
    }

    #[test]
    fn builders_override_individual_fields() {
        let params = SimulationParams::default()
            .with_seed(11)
            .with_vehicle_count(5)
            .with_alert_radius_km(2.5)
            .with_steps_per_segment(4)
            .with_tick_interval_ms(100);

        assert_eq!(params.seed, Some(11));
        assert_eq!(params.vehicle_count, 5);
        assert_eq!(params.alert_radius_km, 2.5);
        assert_eq!(params.steps_per_segment, 4);
        assert_eq!(params.tick_interval_ms, 100);
    }

    #[test]
    fn build_world_inserts_the_engine_resources() {
        let world = build_world(&SimulationParams::default());

        assert!(world.get_resource::<SimulationClock>().is_some());
        assert!(world.get_resource::<SimEvents>().is_some());
        assert!(world.get_resource::<SimTelemetry>().is_some());
        assert!(world.get_resource::<Animator>().is_some());
        assert!(world.get_resource::<ProximityClassifier>().is_some());
    }
}
