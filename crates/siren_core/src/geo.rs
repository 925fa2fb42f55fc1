//! Geographic primitives: great-circle distance and bounded sampling.
//!
//! Coordinates are [`h3o::LatLng`] values, which enforce the valid
//! latitude/longitude ranges at construction. [`distance_km`] is the
//! haversine distance used by the proximity fallback tier; [`MapBounds`]
//! models the visible map area that endpoints and off-route vehicles are
//! drawn from.

use h3o::LatLng;
use rand::Rng;

/// Mean Earth radius in kilometres, as used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance between two points, in kilometres.
///
/// Symmetric, and zero (within floating-point tolerance) iff `a == b`.
pub fn distance_km(a: LatLng, b: LatLng) -> f64 {
    let (lat1, lon1) = (a.lat().to_radians(), a.lng().to_radians());
    let (lat2, lon2) = (b.lat().to_radians(), b.lng().to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Geographic bounding box, validated at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    lat_min: f64,
    lat_max: f64,
    lng_min: f64,
    lng_max: f64,
}

impl MapBounds {
    /// Build a bounding box from its corners.
    ///
    /// # Errors
    ///
    /// Returns an error if either range is inverted or leaves the valid
    /// latitude/longitude domain.
    pub fn new(lat_min: f64, lat_max: f64, lng_min: f64, lng_max: f64) -> Result<Self, String> {
        if lat_min < -90.0 || lat_max > 90.0 || lat_min > lat_max {
            return Err(format!(
                "Invalid latitude bounds: [{}, {}] (must be in [-90, 90] and min <= max)",
                lat_min, lat_max
            ));
        }
        if lng_min < -180.0 || lng_max > 180.0 || lng_min > lng_max {
            return Err(format!(
                "Invalid longitude bounds: [{}, {}] (must be in [-180, 180] and min <= max)",
                lng_min, lng_max
            ));
        }
        Ok(Self {
            lat_min,
            lat_max,
            lng_min,
            lng_max,
        })
    }

    pub fn lat_min(&self) -> f64 {
        self.lat_min
    }

    pub fn lat_max(&self) -> f64 {
        self.lat_max
    }

    pub fn lng_min(&self) -> f64 {
        self.lng_min
    }

    pub fn lng_max(&self) -> f64 {
        self.lng_max
    }

    /// Whether `point` lies inside the box (edges included).
    pub fn contains(&self, point: LatLng) -> bool {
        point.lat() >= self.lat_min
            && point.lat() <= self.lat_max
            && point.lng() >= self.lng_min
            && point.lng() <= self.lng_max
    }

    /// Sample a uniformly random point inside the box.
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> LatLng {
        let lat = rng.gen_range(self.lat_min..=self.lat_max);
        let lng = rng.gen_range(self.lng_min..=self.lng_max);
        LatLng::new(lat, lng).expect("bounds are validated at construction")
    }
}
