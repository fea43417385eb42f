//! Mapbox Directions Matrix provider. Rectangular O×D via the `sources` /
//! `destinations` query parameters; meters and seconds come back natively.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::matrix::{
    MatrixAdapter, MatrixRequest, MatrixResult, TravelMode, UNREACHABLE_DISTANCE_M,
    UNREACHABLE_DURATION_S,
};
use crate::model::Coordinate;

const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";

pub struct MapboxMatrixAdapter {
    access_token: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct MapboxResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    durations: Option<Vec<Vec<Option<f64>>>>,
}

fn profile_for(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Driving => "driving",
        TravelMode::Walking => "walking",
        TravelMode::Cycling => "cycling",
    }
}

fn coord_path(coords: &[Coordinate]) -> String {
    coords
        .iter()
        .map(|c| format!("{},{}", c.lon, c.lat))
        .collect::<Vec<_>>()
        .join(";")
}

fn index_list(range: std::ops::Range<usize>) -> String {
    range
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

impl MapboxMatrixAdapter {
    pub fn new(access_token: String, timeout: Duration) -> Self {
        MapboxMatrixAdapter {
            access_token,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl MatrixAdapter for MapboxMatrixAdapter {
    async fn compute(&self, request: &MatrixRequest) -> Result<MatrixResult> {
        if request.origins.is_empty() || request.destinations.is_empty() {
            return Err(Error::InvalidInput(
                "mapbox matrix requires both 'origins' and 'destinations'".to_string(),
            ));
        }

        let n_o = request.origins.len();
        let n_d = request.destinations.len();
        let all: Vec<Coordinate> = request
            .origins
            .iter()
            .chain(request.destinations.iter())
            .copied()
            .collect();

        let url = format!(
            "{}/directions-matrix/v1/mapbox/{}/{}",
            self.base_url,
            profile_for(request.mode),
            coord_path(&all)
        );
        let response = self
            .client
            .get(&url)
            .query(&[
                ("annotations", "distance,duration".to_string()),
                ("sources", index_list(0..n_o)),
                ("destinations", index_list(n_o..n_o + n_d)),
                ("access_token", self.access_token.clone()),
            ])
            .send()
            .await
            .map_err(|e| Error::MatrixProvider(format!("mapbox: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::MatrixProvider(format!("mapbox HTTP {status}: {text}")));
        }

        let parsed: MapboxResponse = response
            .json()
            .await
            .map_err(|e| Error::MatrixProvider(format!("mapbox bad body: {e}")))?;

        if let Some(code) = &parsed.code {
            if code != "Ok" {
                return Err(Error::MatrixProvider(format!(
                    "mapbox error {code}: {}",
                    parsed.message.unwrap_or_default()
                )));
            }
        }

        let unwrap_rows = |rows: &Vec<Vec<Option<f64>>>, sentinel: f64| -> Vec<Vec<f64>> {
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|v| v.map(|x| x.round()).unwrap_or(sentinel))
                        .collect()
                })
                .collect()
        };

        match (&parsed.distances, &parsed.durations) {
            (Some(d), t) => Ok(MatrixResult {
                distances: unwrap_rows(d, UNREACHABLE_DISTANCE_M as f64),
                durations: t
                    .as_ref()
                    .map(|t| unwrap_rows(t, UNREACHABLE_DURATION_S as f64)),
            }),
            (None, Some(t)) => Ok(MatrixResult {
                distances: vec![vec![0.0; n_d]; n_o],
                durations: Some(unwrap_rows(t, UNREACHABLE_DURATION_S as f64)),
            }),
            (None, None) => Err(Error::MatrixProvider(
                "mapbox returned neither distances nor durations".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    #[tokio::test]
    async fn rectangular_matrix_with_null_cells() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/directions-matrix/v1/mapbox/driving/.*"))
            .and(query_param("sources", "0"))
            .and(query_param("destinations", "1;2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": "Ok",
                "distances": [[1200.0, null]],
                "durations": [[90.0, null]],
            })))
            .mount(&server)
            .await;

        let adapter = MapboxMatrixAdapter::new("token".to_string(), Duration::from_secs(5))
            .with_base_url(server.uri());
        let req = MatrixRequest {
            mode: TravelMode::Driving,
            origins: vec![coord(50.85, 4.35)],
            destinations: vec![coord(50.90, 4.40), coord(51.00, 4.50)],
            parameters: Default::default(),
        };

        let result = adapter.compute(&req).await.unwrap();
        assert_eq!(result.distances[0][0], 1200.0);
        assert_eq!(result.distances[0][1], UNREACHABLE_DISTANCE_M as f64);
        assert_eq!(result.durations.unwrap()[0][0], 90.0);
    }

    #[tokio::test]
    async fn non_ok_code_is_a_provider_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": "InvalidInput",
                "message": "Too many coordinates",
            })))
            .mount(&server)
            .await;

        let adapter = MapboxMatrixAdapter::new("token".to_string(), Duration::from_secs(5))
            .with_base_url(server.uri());
        let req = MatrixRequest::square(vec![coord(1.0, 2.0)], TravelMode::Driving);
        let err = adapter.compute(&req).await.unwrap_err();
        assert!(err.to_string().contains("Too many coordinates"));
        assert_eq!(err.status_code(), 502);
    }
}
