//! Offline planar adapter: pairwise Euclidean distances over solver-space
//! coordinates. Benchmark instances alias (x, y) onto the (lat, lon) fields,
//! so the request's geographic slots are read as planar units here. Durations
//! are not produced. An optional `meters_per_unit` scales the result;
//! otherwise one planar unit is reported as one meter.

use async_trait::async_trait;
use rayon::prelude::*;

use crate::error::Result;
use crate::matrix::{MatrixAdapter, MatrixRequest, MatrixResult};

#[derive(Debug, Default)]
pub struct EuclideanAdapter;

impl EuclideanAdapter {
    pub fn new() -> Self {
        EuclideanAdapter
    }
}

/// Square planar matrix over (x, y) pairs; shared with the input normalizer's
/// EUC_2D auto-build path.
pub fn euclidean_matrix(points: &[(f64, f64)]) -> Vec<Vec<f64>> {
    points
        .par_iter()
        .map(|&(xi, yi)| {
            points
                .iter()
                .map(|&(xj, yj)| ((xi - xj).powi(2) + (yi - yj).powi(2)).sqrt())
                .collect()
        })
        .collect()
}

#[async_trait]
impl MatrixAdapter for EuclideanAdapter {
    async fn compute(&self, request: &MatrixRequest) -> Result<MatrixResult> {
        let scale = request.parameters.meters_per_unit.unwrap_or(1.0);
        let distances = request
            .origins
            .par_iter()
            .map(|o| {
                request
                    .destinations
                    .iter()
                    .map(|d| {
                        let dx = o.lat - d.lat;
                        let dy = o.lon - d.lon;
                        ((dx * dx + dy * dy).sqrt() * scale).round()
                    })
                    .collect()
            })
            .collect();

        Ok(MatrixResult {
            distances,
            durations: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::TravelMode;
    use crate::model::Coordinate;

    #[tokio::test]
    async fn three_four_five_triangle() {
        let pts = vec![
            Coordinate { lat: 0.0, lon: 0.0 },
            Coordinate { lat: 3.0, lon: 0.0 },
            Coordinate { lat: 3.0, lon: 4.0 },
        ];
        let req = MatrixRequest::square(pts, TravelMode::Driving);
        let result = EuclideanAdapter::new().compute(&req).await.unwrap();

        assert_eq!(result.distances[0][1], 3.0);
        assert_eq!(result.distances[1][2], 4.0);
        assert_eq!(result.distances[0][2], 5.0);
        for i in 0..3 {
            assert_eq!(result.distances[i][i], 0.0);
        }
        assert!(result.durations.is_none());
    }

    #[tokio::test]
    async fn meters_per_unit_scales_the_result() {
        let pts = vec![
            Coordinate { lat: 0.0, lon: 0.0 },
            Coordinate { lat: 1.0, lon: 0.0 },
        ];
        let mut req = MatrixRequest::square(pts, TravelMode::Driving);
        req.parameters.meters_per_unit = Some(250.0);
        let result = EuclideanAdapter::new().compute(&req).await.unwrap();
        assert_eq!(result.distances[0][1], 250.0);
    }

    #[test]
    fn helper_matrix_is_symmetric_with_zero_diagonal() {
        let m = euclidean_matrix(&[(0.0, 0.0), (1.0, 1.0), (5.0, 2.0)]);
        for i in 0..3 {
            assert_eq!(m[i][i], 0.0);
            for j in 0..3 {
                assert!((m[i][j] - m[j][i]).abs() < 1e-9);
            }
        }
    }
}
