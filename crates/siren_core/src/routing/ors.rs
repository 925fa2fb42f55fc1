//! OpenRouteService directions client.
//!
//! Wraps a blocking HTTP client for the `/v2/directions/driving-car`
//! endpoint and parses the GeoJSON feature geometry into a [`Route`],
//! converting the service's `[lng, lat]` pairs into `(lat, lng)` points.

use h3o::LatLng;
use reqwest::{blocking::Client, Url};
use serde::Deserialize;
use std::time::Duration;

use super::{Route, RouteError, RouteSource};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Thin HTTP client for OpenRouteService driving directions.
#[derive(Debug, Clone)]
pub struct OrsRouteSource {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OrsRouteSource {
    /// Create a client for the given endpoint
    /// (e.g. `https://api.openrouteservice.org`).
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build directions client");
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

impl RouteSource for OrsRouteSource {
    fn route(&self, start: LatLng, end: LatLng) -> Result<Route, RouteError> {
        let base = format!("{}/v2/directions/driving-car", self.endpoint);
        let mut url = Url::parse(&base)
            .map_err(|err| RouteError::Api(format!("failed to build directions URL: {}", err)))?;

        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("start", &format!("{},{}", start.lng(), start.lat()))
            .append_pair("end", &format!("{},{}", end.lng(), end.lat()));

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .map_err(RouteError::Http)?
            .error_for_status()
            .map_err(RouteError::Http)?;

        let parsed: OrsDirectionsResponse = response.json().map_err(RouteError::Json)?;
        parse_directions_response(parsed)
    }
}

#[derive(Deserialize)]
struct OrsDirectionsResponse {
    features: Option<Vec<OrsFeature>>,
}

#[derive(Deserialize)]
struct OrsFeature {
    geometry: OrsGeometry,
}

#[derive(Deserialize)]
struct OrsGeometry {
    coordinates: Vec<Vec<f64>>, // [lng, lat]
}

fn parse_directions_response(resp: OrsDirectionsResponse) -> Result<Route, RouteError> {
    let feature = resp
        .features
        .and_then(|features| features.into_iter().next())
        .ok_or(RouteError::NoRoute)?;

    let mut points = Vec::with_capacity(feature.geometry.coordinates.len());
    for coordinate in &feature.geometry.coordinates {
        let (lng, lat) = match (coordinate.first(), coordinate.get(1)) {
            (Some(&lng), Some(&lat)) => (lng, lat),
            _ => return Err(RouteError::NoRoute),
        };
        let point = LatLng::new(lat, lng).map_err(|_| RouteError::NoRoute)?;
        points.push(point);
    }
    Route::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(coordinates: Vec<Vec<f64>>) -> OrsDirectionsResponse {
        OrsDirectionsResponse {
            features: Some(vec![OrsFeature {
                geometry: OrsGeometry { coordinates },
            }]),
        }
    }

    #[test]
    fn parse_converts_lng_lat_pairs_to_lat_lng_points() {
        let response = response_with(vec![vec![72.6369, 23.0225], vec![72.64, 23.03]]);

        let route = parse_directions_response(response).expect("should parse");
        assert_eq!(route.waypoint_count(), 2);
        assert_eq!(route.start(), LatLng::new(23.0225, 72.6369).unwrap());
        assert_eq!(route.end(), LatLng::new(23.03, 72.64).unwrap());
    }

    #[test]
    fn parse_rejects_missing_features() {
        let response = OrsDirectionsResponse { features: None };
        assert!(matches!(
            parse_directions_response(response),
            Err(RouteError::NoRoute)
        ));

        let empty = OrsDirectionsResponse {
            features: Some(Vec::new()),
        };
        assert!(matches!(
            parse_directions_response(empty),
            Err(RouteError::NoRoute)
        ));
    }

    #[test]
    fn parse_rejects_short_coordinate_arrays() {
        let response = response_with(vec![vec![72.6369, 23.0225], vec![72.64]]);
        assert!(matches!(
            parse_directions_response(response),
            Err(RouteError::NoRoute)
        ));
    }

    #[test]
    fn parse_rejects_single_point_geometry() {
        let response = response_with(vec![vec![72.6369, 23.0225]]);
        assert!(matches!(
            parse_directions_response(response),
            Err(RouteError::Degenerate)
        ));
    }

    #[test]
    fn parse_rejects_out_of_range_coordinates() {
        let response = response_with(vec![vec![72.6369, 123.0], vec![72.64, 23.03]]);
        assert!(matches!(
            parse_directions_response(response),
            Err(RouteError::NoRoute)
        ));
    }
}
