//! Two-tier proximity classification.
//!
//! The primary tier asks a remote distance-matrix service for the road
//! distance from the ambulance to every vehicle in one batch request. Any
//! failure there (transport error, timeout, non-success status, missing or
//! misaligned distance data) degrades to the great-circle fallback, which is
//! a pure function of its inputs and therefore exactly reproducible.
//!
//! A vehicle is alerted iff `0 < distance <= radius`. The strict lower bound
//! excludes a vehicle co-located with the ambulance, whose self-distance
//! would otherwise read as zero.

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;
use h3o::LatLng;

use crate::ecs::VehicleId;
use crate::geo::distance_km;

#[cfg(feature = "ors")]
pub mod matrix;

/// Alert flag per vehicle, computed fresh each tick and applied as a full
/// replacement of the previous tick's flags.
pub type AlertStates = HashMap<VehicleId, bool>;

/// Errors encountered while querying a distance matrix.
#[derive(Debug)]
pub enum MatrixError {
    #[cfg(feature = "ors")]
    Http(reqwest::Error),
    #[cfg(feature = "ors")]
    Json(reqwest::Error),
    MissingDistances,
    Misaligned { expected: usize, actual: usize },
}

/// Trait for batch distance backends. `None` entries mark destinations the
/// service considers unreachable.
pub trait DistanceMatrix: Send + Sync {
    /// Distances in kilometres from `origin` to each destination, aligned
    /// 1:1 with `destinations`.
    fn distances_km(
        &self,
        origin: LatLng,
        destinations: &[LatLng],
    ) -> Result<Vec<Option<f64>>, MatrixError>;
}

/// Outcome of one classification pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub alerts: AlertStates,
    /// True when the primary tier was configured but failed and the
    /// great-circle fallback produced the result instead.
    pub degraded: bool,
}

/// Decides which vehicles fall within the alert radius of the ambulance.
#[derive(Resource)]
pub struct ProximityClassifier {
    radius_km: f64,
    primary: Option<Box<dyn DistanceMatrix>>,
}

impl ProximityClassifier {
    /// Fallback-only classifier (no remote distance service).
    pub fn new(radius_km: f64) -> Self {
        Self {
            radius_km,
            primary: None,
        }
    }

    /// Classifier with a remote distance-matrix primary tier.
    pub fn with_primary(radius_km: f64, primary: Box<dyn DistanceMatrix>) -> Self {
        Self {
            radius_km,
            primary: Some(primary),
        }
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Classify every vehicle against `origin`.
    ///
    /// Never fails: primary-tier errors are recovered locally by the
    /// fallback and reported through [`Classification::degraded`].
    pub fn classify(&self, origin: LatLng, vehicles: &[(VehicleId, LatLng)]) -> Classification {
        if vehicles.is_empty() {
            return Classification {
                alerts: AlertStates::new(),
                degraded: false,
            };
        }

        if let Some(primary) = &self.primary {
            let destinations: Vec<LatLng> = vehicles.iter().map(|(_, position)| *position).collect();
            match primary.distances_km(origin, &destinations) {
                Ok(distances) if distances.len() == vehicles.len() => {
                    let alerts = vehicles
                        .iter()
                        .zip(distances)
                        .map(|((id, _), distance)| {
                            let alerted =
                                matches!(distance, Some(d) if within_radius(d, self.radius_km));
                            (*id, alerted)
                        })
                        .collect();
                    return Classification {
                        alerts,
                        degraded: false,
                    };
                }
                Ok(distances) => {
                    log::warn!(
                        "distance matrix returned {} entries for {} vehicles, using great-circle distances",
                        distances.len(),
                        vehicles.len()
                    );
                }
                Err(err) => {
                    log::warn!(
                        "distance matrix request failed ({:?}), using great-circle distances",
                        err
                    );
                }
            }
            return Classification {
                alerts: great_circle_alerts(origin, vehicles, self.radius_km),
                degraded: true,
            };
        }

        Classification {
            alerts: great_circle_alerts(origin, vehicles, self.radius_km),
            degraded: false,
        }
    }
}

/// Fallback tier: per-vehicle haversine distance. Pure function of its
/// inputs.
pub fn great_circle_alerts(
    origin: LatLng,
    vehicles: &[(VehicleId, LatLng)],
    radius_km: f64,
) -> AlertStates {
    vehicles
        .iter()
        .map(|(id, position)| {
            (
                *id,
                within_radius(distance_km(origin, *position), radius_km),
            )
        })
        .collect()
}

fn within_radius(distance_km: f64, radius_km: f64) -> bool {
    distance_km > 0.0 && distance_km <= radius_km
}
