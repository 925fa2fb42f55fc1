//! Pluggable route sources: trait abstraction for route generation backends.
//!
//! Two implementations, selectable via [`RouteSourceKind`]:
//!
//! - **`LinearRouteSource`**: straight-line interpolation between the two
//!   endpoints. Zero external dependencies; never fails for distinct
//!   endpoints.
//! - **`routing::ors::OrsRouteSource`** (feature `ors`): calls the
//!   OpenRouteService directions HTTP endpoint.
//!
//! The source is stored as a `Box<dyn RouteSource>` by the controller,
//! constructed from `RouteSourceKind` when the simulation is set up.

use h3o::LatLng;

#[cfg(feature = "ors")]
pub mod ors;

/// Interpolation steps used by [`LinearRouteSource`] unless overridden.
pub const DEFAULT_LINEAR_STEPS: usize = 10;

/// An ordered sequence of at least two geographic waypoints. Immutable once
/// produced; a new simulation cycle replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    points: Vec<LatLng>,
}

impl Route {
    /// Wrap a waypoint sequence.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Degenerate`] for fewer than two points.
    pub fn new(points: Vec<LatLng>) -> Result<Self, RouteError> {
        if points.len() < 2 {
            return Err(RouteError::Degenerate);
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    pub fn start(&self) -> LatLng {
        self.points[0]
    }

    pub fn end(&self) -> LatLng {
        self.points[self.points.len() - 1]
    }

    pub fn waypoint_count(&self) -> usize {
        self.points.len()
    }

    pub fn segment_count(&self) -> usize {
        self.points.len() - 1
    }
}

/// Errors encountered while generating a route.
#[derive(Debug)]
pub enum RouteError {
    #[cfg(feature = "ors")]
    Http(reqwest::Error),
    #[cfg(feature = "ors")]
    Json(reqwest::Error),
    Api(String),
    NoRoute,
    Degenerate,
}

#[cfg(feature = "ors")]
impl From<reqwest::Error> for RouteError {
    fn from(err: reqwest::Error) -> Self {
        RouteError::Http(err)
    }
}

/// Trait for route generation backends. Implementations must be
/// `Send + Sync` so the source can be shared with test doubles.
pub trait RouteSource: Send + Sync {
    /// Generate a route from `start` to `end`.
    fn route(&self, start: LatLng, end: LatLng) -> Result<Route, RouteError>;
}

/// Which route backend to use.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteSourceKind {
    /// Straight-line interpolation with the given number of steps.
    Linear { steps: usize },
    /// OpenRouteService directions endpoint.
    #[cfg(feature = "ors")]
    Ors { endpoint: String, api_key: String },
}

impl Default for RouteSourceKind {
    fn default() -> Self {
        RouteSourceKind::Linear {
            steps: DEFAULT_LINEAR_STEPS,
        }
    }
}

/// Routes by linearly interpolating between the endpoints, inclusive of
/// both. Produces `steps + 1` waypoints.
pub struct LinearRouteSource {
    steps: usize,
}

impl LinearRouteSource {
    pub fn new(steps: usize) -> Self {
        Self {
            steps: steps.max(1),
        }
    }
}

impl Default for LinearRouteSource {
    fn default() -> Self {
        Self::new(DEFAULT_LINEAR_STEPS)
    }
}

impl RouteSource for LinearRouteSource {
    fn route(&self, start: LatLng, end: LatLng) -> Result<Route, RouteError> {
        if start == end {
            return Err(RouteError::Degenerate);
        }

        let mut points = Vec::with_capacity(self.steps + 1);
        for i in 0..=self.steps {
            let t = i as f64 / self.steps as f64;
            let lat = start.lat() + (end.lat() - start.lat()) * t;
            let lng = start.lng() + (end.lng() - start.lng()) * t;
            points.push(LatLng::new(lat, lng).map_err(|_| RouteError::NoRoute)?);
        }
        Route::new(points)
    }
}

/// Construct a boxed [`RouteSource`] from a [`RouteSourceKind`] descriptor.
pub fn build_route_source(kind: &RouteSourceKind) -> Box<dyn RouteSource> {
    match kind {
        RouteSourceKind::Linear { steps } => Box::new(LinearRouteSource::new(*steps)),

        #[cfg(feature = "ors")]
        RouteSourceKind::Ors { endpoint, api_key } => {
            Box::new(ors::OrsRouteSource::new(endpoint, api_key))
        }
    }
}
