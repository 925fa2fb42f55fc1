//! OpenRouteService distance-matrix client.
//!
//! One POST per classification pass: the ambulance position is the sole
//! source and every vehicle position a destination, with distances requested
//! in kilometres. The first `distances` row must align 1:1 with the
//! destination order; anything else is an error the classifier recovers
//! from by falling back to great-circle distances.

use h3o::LatLng;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{DistanceMatrix, MatrixError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Thin HTTP client for OpenRouteService matrix queries.
#[derive(Debug, Clone)]
pub struct MatrixClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl MatrixClient {
    /// Create a client for the given endpoint
    /// (e.g. `https://api.openrouteservice.org`).
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build matrix client");
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

impl DistanceMatrix for MatrixClient {
    fn distances_km(
        &self,
        origin: LatLng,
        destinations: &[LatLng],
    ) -> Result<Vec<Option<f64>>, MatrixError> {
        let mut locations = Vec::with_capacity(destinations.len() + 1);
        locations.push([origin.lng(), origin.lat()]);
        locations.extend(destinations.iter().map(|point| [point.lng(), point.lat()]));

        let body = MatrixRequest {
            locations,
            sources: [0],
            destinations: (1..=destinations.len()).collect(),
            metrics: ["distance"],
            units: "km",
        };

        let url = format!("{}/v2/matrix/driving-car", self.endpoint);
        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .header("Authorization", &self.api_key)
            .json(&body)
            .send()
            .map_err(MatrixError::Http)?
            .error_for_status()
            .map_err(MatrixError::Http)?;

        let parsed: MatrixResponse = response.json().map_err(MatrixError::Json)?;
        parse_matrix_response(parsed, destinations.len())
    }
}

#[derive(Serialize)]
struct MatrixRequest {
    locations: Vec<[f64; 2]>, // [lng, lat]
    sources: [usize; 1],
    destinations: Vec<usize>,
    metrics: [&'static str; 1],
    units: &'static str,
}

#[derive(Deserialize)]
struct MatrixResponse {
    distances: Option<Vec<Vec<Option<f64>>>>,
}

fn parse_matrix_response(
    resp: MatrixResponse,
    expected: usize,
) -> Result<Vec<Option<f64>>, MatrixError> {
    let mut rows = resp.distances.ok_or(MatrixError::MissingDistances)?;
    if rows.is_empty() {
        return Err(MatrixError::MissingDistances);
    }
    let row = rows.swap_remove(0);
    if row.len() != expected {
        return Err(MatrixError::Misaligned {
            expected,
            actual: row.len(),
        });
    }
    Ok(row)
}
