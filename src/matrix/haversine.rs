//! Offline great-circle adapter. Distances only; no road network means no
//! defensible duration estimate, so durations stay absent.

use async_trait::async_trait;
use geo::HaversineDistance;
use geo::Point;

use crate::error::{Error, Result};
use crate::matrix::{MatrixAdapter, MatrixRequest, MatrixResult};
use crate::model::Coordinate;

#[derive(Debug, Default)]
pub struct HaversineAdapter;

impl HaversineAdapter {
    pub fn new() -> Self {
        HaversineAdapter
    }
}

/// Great-circle distance in meters.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let p1 = Point::new(a.lon, a.lat);
    let p2 = Point::new(b.lon, b.lat);
    p1.haversine_distance(&p2)
}

#[async_trait]
impl MatrixAdapter for HaversineAdapter {
    async fn compute(&self, request: &MatrixRequest) -> Result<MatrixResult> {
        if request.origins.is_empty() {
            return Err(Error::InvalidInput(
                "haversine: 'origins' is required".to_string(),
            ));
        }

        let distances = request
            .origins
            .iter()
            .map(|&o| {
                request
                    .destinations
                    .iter()
                    .map(|&d| haversine_m(o, d).round())
                    .collect()
            })
            .collect();

        Ok(MatrixResult {
            distances,
            durations: None,
        })
    }
}
