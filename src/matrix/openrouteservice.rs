//! openrouteservice matrix provider.
//!
//! ORS charges by element count, so identical coordinates are deduplicated
//! before the request goes out and the full origins × destinations matrix is
//! rebuilt from the deduplicated response. Row/column order is preserved.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::matrix::{
    MatrixAdapter, MatrixRequest, MatrixResult, TravelMode, UNREACHABLE_DISTANCE_M,
    UNREACHABLE_DURATION_S,
};
use crate::model::Coordinate;

const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

pub struct OrsAdapter {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct OrsResponse {
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    durations: Option<Vec<Vec<Option<f64>>>>,
}

fn profile_for(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Driving => "driving-car",
        TravelMode::Cycling => "cycling-regular",
        TravelMode::Walking => "foot-walking",
    }
}

/// Dedup key at ~1e-6 degree (≈0.1 m).
fn coord_key(c: Coordinate) -> (i64, i64) {
    ((c.lat * 1e6).round() as i64, (c.lon * 1e6).round() as i64)
}

impl OrsAdapter {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        OrsAdapter {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Test hook: point the adapter at a mock server.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn meter_factor(units: &str, sample: &[f64]) -> f64 {
        match units {
            "km" => 1000.0,
            "mi" | "mile" | "miles" => 1609.344,
            _ => {
                // Unknown or metric: if every off-diagonal value is tiny the
                // provider answered in kilometers despite the requested unit.
                let max = sample.iter().cloned().fold(0.0f64, f64::max);
                if max > 0.0 && max < 20.0 {
                    1000.0
                } else {
                    1.0
                }
            }
        }
    }
}

#[async_trait]
impl MatrixAdapter for OrsAdapter {
    async fn compute(&self, request: &MatrixRequest) -> Result<MatrixResult> {
        if request.origins.is_empty() || request.destinations.is_empty() {
            return Err(Error::InvalidInput(
                "openrouteservice requires both 'origins' and 'destinations'".to_string(),
            ));
        }

        // Deduplicate coordinates and remember, per request slot, where its
        // unique location landed.
        let mut unique: Vec<[f64; 2]> = Vec::new();
        let mut index_of: HashMap<(i64, i64), usize> = HashMap::new();
        let mut slot = |c: Coordinate| -> usize {
            *index_of.entry(coord_key(c)).or_insert_with(|| {
                unique.push([c.lon, c.lat]);
                unique.len() - 1
            })
        };
        let origin_slots: Vec<usize> = request.origins.iter().map(|&c| slot(c)).collect();
        let dest_slots: Vec<usize> = request.destinations.iter().map(|&c| slot(c)).collect();

        // Unique source/destination index lists, in first-seen order.
        let mut sources: Vec<usize> = Vec::new();
        for &s in &origin_slots {
            if !sources.contains(&s) {
                sources.push(s);
            }
        }
        let mut destinations: Vec<usize> = Vec::new();
        for &d in &dest_slots {
            if !destinations.contains(&d) {
                destinations.push(d);
            }
        }
        let source_row: HashMap<usize, usize> =
            sources.iter().enumerate().map(|(row, &s)| (s, row)).collect();
        let dest_col: HashMap<usize, usize> =
            destinations.iter().enumerate().map(|(col, &d)| (d, col)).collect();

        let body = json!({
            "locations": unique,
            "sources": sources,
            "destinations": destinations,
            "metrics": &request.parameters.metrics,
            "units": &request.parameters.units,
        });

        let url = format!(
            "{}/v2/matrix/{}",
            self.base_url,
            profile_for(request.mode)
        );
        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::MatrixProvider(format!("openrouteservice: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::MatrixProvider(format!(
                "openrouteservice HTTP {status}: {text}"
            )));
        }

        let parsed: OrsResponse = response
            .json()
            .await
            .map_err(|e| Error::MatrixProvider(format!("openrouteservice bad body: {e}")))?;

        let n_o = request.origins.len();
        let n_d = request.destinations.len();

        let factor = parsed
            .distances
            .as_ref()
            .map(|rows| {
                let sample: Vec<f64> = rows
                    .iter()
                    .flatten()
                    .filter_map(|v| *v)
                    .filter(|v| *v > 0.0)
                    .collect();
                Self::meter_factor(&request.parameters.units, &sample)
            })
            .unwrap_or(1.0);

        // Rebuild the O×D matrix in request order from the deduplicated
        // response.
        let distances = parsed.distances.as_ref().map(|rows| {
            (0..n_o)
                .map(|i| {
                    (0..n_d)
                        .map(|j| {
                            let row = source_row[&origin_slots[i]];
                            let col = dest_col[&dest_slots[j]];
                            match rows.get(row).and_then(|r| r.get(col)).copied().flatten() {
                                Some(v) => (v * factor).round(),
                                None => UNREACHABLE_DISTANCE_M as f64,
                            }
                        })
                        .collect()
                })
                .collect::<Vec<Vec<f64>>>()
        });
        let durations = parsed.durations.as_ref().map(|rows| {
            (0..n_o)
                .map(|i| {
                    (0..n_d)
                        .map(|j| {
                            let row = source_row[&origin_slots[i]];
                            let col = dest_col[&dest_slots[j]];
                            match rows.get(row).and_then(|r| r.get(col)).copied().flatten() {
                                Some(v) => v.round(),
                                None => UNREACHABLE_DURATION_S as f64,
                            }
                        })
                        .collect()
                })
                .collect::<Vec<Vec<f64>>>()
        });

        match (distances, durations) {
            (Some(distances), durations) => Ok(MatrixResult { distances, durations }),
            (None, Some(durations)) => Ok(MatrixResult {
                // Duration-only responses still need a distance table shape.
                distances: vec![vec![0.0; n_d]; n_o],
                durations: Some(durations),
            }),
            (None, None) => Err(Error::MatrixProvider(
                "openrouteservice returned neither distances nor durations".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    #[tokio::test]
    async fn deduplicates_and_rebuilds_the_full_matrix() {
        let server = MockServer::start().await;
        // Origins repeat the same point; only 2 unique locations go upstream.
        Mock::given(method("POST"))
            .and(path("/v2/matrix/driving-car"))
            .and(body_partial_json(serde_json::json!({
                "sources": [0],
                "destinations": [0, 1],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "distances": [[0.0, 1500.0]],
                "durations": [[0.0, 120.0]],
            })))
            .mount(&server)
            .await;

        let adapter = OrsAdapter::new("key".to_string(), Duration::from_secs(5))
            .with_base_url(server.uri());
        let req = MatrixRequest {
            mode: TravelMode::Driving,
            origins: vec![coord(50.85, 4.35), coord(50.85, 4.35)],
            destinations: vec![coord(50.85, 4.35), coord(50.90, 4.40)],
            parameters: Default::default(),
        };

        let result = adapter.compute(&req).await.unwrap();
        assert_eq!(result.distances.len(), 2);
        assert_eq!(result.distances[0], vec![0.0, 1500.0]);
        assert_eq!(result.distances[1], vec![0.0, 1500.0]);
        assert_eq!(result.durations.unwrap()[1], vec![0.0, 120.0]);
    }

    #[tokio::test]
    async fn upstream_error_text_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let adapter = OrsAdapter::new("key".to_string(), Duration::from_secs(5))
            .with_base_url(server.uri());
        let req = MatrixRequest::square(vec![coord(1.0, 2.0)], TravelMode::Driving);
        let err = adapter.compute(&req).await.unwrap_err();

        assert!(matches!(err, Error::MatrixProvider(_)));
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn kilometre_shaped_answers_are_scaled_to_meters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "distances": [[0.0, 1.5], [1.5, 0.0]],
            })))
            .mount(&server)
            .await;

        let adapter = OrsAdapter::new("key".to_string(), Duration::from_secs(5))
            .with_base_url(server.uri());
        let req = MatrixRequest::square(
            vec![coord(50.85, 4.35), coord(50.90, 4.40)],
            TravelMode::Driving,
        );
        let result = adapter.compute(&req).await.unwrap();
        assert_eq!(result.distances[0][1], 1500.0);
    }
}
