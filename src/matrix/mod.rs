//! Distance-matrix acquisition: request/result types, the adapter contract,
//! and the canonical integer matrix consumed by solver engines.
//!
//! Every adapter returns distances in integer-valued meters and durations in
//! integer-valued seconds, regardless of what the upstream provider speaks.
//! Unreachable pairs are large finite sentinels, never infinities.

pub mod euclidean;
pub mod google;
pub mod graph;
pub mod haversine;
pub mod mapbox;
pub mod openrouteservice;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{Error, Result};
use crate::model::Coordinate;

/// Sentinel for unreachable pairs: 10⁶ km expressed in meters.
pub const UNREACHABLE_DISTANCE_M: i64 = 1_000_000_000;
/// Sentinel for unreachable pairs: 10⁷ seconds.
pub const UNREACHABLE_DURATION_S: i64 = 10_000_000;

// ============ Travel modes ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[serde(alias = "drive", alias = "car")]
    Driving,
    #[serde(alias = "walk", alias = "foot")]
    Walking,
    #[serde(alias = "bike", alias = "bicycle")]
    Cycling,
}

impl Default for TravelMode {
    fn default() -> Self {
        TravelMode::Driving
    }
}

impl TravelMode {
    /// Local graph network type for this mode.
    pub fn network_type(self) -> &'static str {
        match self {
            TravelMode::Driving => "drive",
            TravelMode::Walking => "walk",
            TravelMode::Cycling => "bike",
        }
    }
}

// ============ Requests ============

/// Extra adapter tuning carried alongside the coordinate lists.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct MatrixParameters {
    /// Requested metrics subset; adapters may ignore what they cannot serve.
    pub metrics: Vec<String>,
    /// Unit preference forwarded to providers that support one.
    pub units: String,
    /// Euclidean adapter: meters per planar unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meters_per_unit: Option<f64>,
}

impl Default for MatrixParameters {
    fn default() -> Self {
        MatrixParameters {
            metrics: vec!["distance".to_string(), "duration".to_string()],
            units: "m".to_string(),
            meters_per_unit: None,
        }
    }
}

impl MatrixParameters {
    pub fn wants(&self, metric: &str) -> bool {
        self.metrics.iter().any(|m| m == metric)
    }
}

/// A validated matrix request: non-empty origin and destination lists.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixRequest {
    pub mode: TravelMode,
    pub origins: Vec<Coordinate>,
    pub destinations: Vec<Coordinate>,
    pub parameters: MatrixParameters,
}

/// Wire shape: callers may send `origins` + `destinations`, or one
/// `coordinates` list used for both sides.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MatrixRequestWire {
    pub adapter: String,
    #[serde(default)]
    pub mode: TravelMode,
    #[serde(default)]
    pub origins: Option<Vec<Coordinate>>,
    #[serde(default)]
    pub destinations: Option<Vec<Coordinate>>,
    #[serde(default)]
    pub coordinates: Option<Vec<Coordinate>>,
    #[serde(default)]
    pub parameters: Option<MatrixParameters>,
}

impl MatrixRequestWire {
    pub fn into_request(self) -> Result<(String, MatrixRequest)> {
        let origins = self.origins.or_else(|| self.coordinates.clone());
        let destinations = self.destinations.or(self.coordinates);
        let (origins, destinations) = match (origins, destinations) {
            (Some(o), Some(d)) if !o.is_empty() && !d.is_empty() => (o, d),
            _ => {
                return Err(Error::InvalidInput(
                    "origins and destinations are required (or provide coordinates)".to_string(),
                ))
            }
        };
        Ok((
            self.adapter,
            MatrixRequest {
                mode: self.mode,
                origins,
                destinations,
                parameters: self.parameters.unwrap_or_default(),
            },
        ))
    }
}

impl MatrixRequest {
    pub fn square(coordinates: Vec<Coordinate>, mode: TravelMode) -> Self {
        MatrixRequest {
            mode,
            origins: coordinates.clone(),
            destinations: coordinates,
            parameters: MatrixParameters::default(),
        }
    }

    /// Cache fingerprint: adapter name, mode, parameters, and coordinates
    /// rounded to ~0.1 m so float noise does not defeat caching.
    pub fn fingerprint(&self, adapter: &str) -> String {
        let mut key = String::with_capacity(64 + 24 * (self.origins.len() + self.destinations.len()));
        key.push_str(adapter);
        key.push('|');
        key.push_str(self.mode.network_type());
        key.push('|');
        key.push_str(&self.parameters.metrics.join(","));
        key.push('|');
        for c in self.origins.iter().chain(self.destinations.iter()) {
            key.push_str(&format!("{:.6},{:.6};", c.lat, c.lon));
        }
        key
    }
}

// ============ Results ============

/// Matrix as adapters produce it and the wire carries it. Distances are
/// integer-valued meters, durations integer-valued seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MatrixResult {
    pub distances: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durations: Option<Vec<Vec<f64>>>,
}

impl MatrixResult {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// Canonical matrix at the engine boundary: i64 meters / seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    pub distances: Vec<Vec<i64>>,
    pub durations: Option<Vec<Vec<i64>>>,
}

impl Matrix {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn is_square(&self) -> bool {
        let n = self.distances.len();
        self.distances.iter().all(|row| row.len() == n)
    }

    pub fn distance(&self, from: usize, to: usize) -> i64 {
        self.distances[from][to]
    }

    pub fn duration(&self, from: usize, to: usize) -> Option<i64> {
        self.durations.as_ref().map(|d| d[from][to])
    }

    /// Travel time used for propagation: durations when present, else the
    /// distance value reinterpreted as time units.
    pub fn travel_time(&self, from: usize, to: usize) -> i64 {
        match &self.durations {
            Some(durations) => durations[from][to],
            None => self.distances[from][to],
        }
    }

    /// Wire form (f64) for responses and enrichment output.
    pub fn to_result(&self) -> MatrixResult {
        MatrixResult {
            distances: self
                .distances
                .iter()
                .map(|row| row.iter().map(|&v| v as f64).collect())
                .collect(),
            durations: self.durations.as_ref().map(|rows| {
                rows.iter()
                    .map(|row| row.iter().map(|&v| v as f64).collect())
                    .collect()
            }),
        }
    }
}

// ============ Adapter contract ============

/// All online/offline distance-matrix providers implement this.
#[async_trait]
pub trait MatrixAdapter: Send + Sync {
    /// Compute an origins × destinations matrix. Row i corresponds to
    /// `origins[i]`, column j to `destinations[j]`, even when the adapter
    /// deduplicates coordinates internally.
    async fn compute(&self, request: &MatrixRequest) -> Result<MatrixResult>;
}

pub type BoxedAdapter = Box<dyn MatrixAdapter>;
