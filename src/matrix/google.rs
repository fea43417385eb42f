//! Google Distance Matrix provider. Elements that come back non-OK are
//! clamped to the unreachable sentinels instead of poisoning the matrix with
//! infinities.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::matrix::{
    MatrixAdapter, MatrixRequest, MatrixResult, TravelMode, UNREACHABLE_DISTANCE_M,
    UNREACHABLE_DURATION_S,
};
use crate::model::Coordinate;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

pub struct GoogleMatrixAdapter {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct GoogleValue {
    value: f64,
}

#[derive(Deserialize)]
struct GoogleElement {
    status: String,
    #[serde(default)]
    distance: Option<GoogleValue>,
    #[serde(default)]
    duration: Option<GoogleValue>,
}

#[derive(Deserialize)]
struct GoogleRow {
    #[serde(default)]
    elements: Vec<GoogleElement>,
}

#[derive(Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<GoogleRow>,
}

fn mode_for(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Driving => "driving",
        TravelMode::Walking => "walking",
        TravelMode::Cycling => "bicycling",
    }
}

fn pipe_join(coords: &[Coordinate]) -> String {
    coords
        .iter()
        .map(|c| format!("{},{}", c.lat, c.lon))
        .collect::<Vec<_>>()
        .join("|")
}

impl GoogleMatrixAdapter {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        GoogleMatrixAdapter {
            api_key,
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
impl MatrixAdapter for GoogleMatrixAdapter {
    async fn compute(&self, request: &MatrixRequest) -> Result<MatrixResult> {
        if request.origins.is_empty() || request.destinations.is_empty() {
            return Err(Error::InvalidInput(
                "google matrix requires both 'origins' and 'destinations'".to_string(),
            ));
        }

        let url = format!("{}/maps/api/distancematrix/json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("origins", pipe_join(&request.origins)),
                ("destinations", pipe_join(&request.destinations)),
                ("mode", mode_for(request.mode).to_string()),
                ("units", "metric".to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| Error::MatrixProvider(format!("google: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::MatrixProvider(format!("google HTTP {status}: {text}")));
        }

        let parsed: GoogleResponse = response
            .json()
            .await
            .map_err(|e| Error::MatrixProvider(format!("google bad body: {e}")))?;

        if parsed.status != "OK" {
            return Err(Error::MatrixProvider(format!(
                "google API error: {}",
                parsed.error_message.unwrap_or_else(|| parsed.status.clone())
            )));
        }

        let mut distances = Vec::with_capacity(parsed.rows.len());
        let mut durations = Vec::with_capacity(parsed.rows.len());
        for row in &parsed.rows {
            let mut drow = Vec::with_capacity(row.elements.len());
            let mut trow = Vec::with_capacity(row.elements.len());
            for element in &row.elements {
                if element.status == "OK" {
                    drow.push(
                        element
                            .distance
                            .as_ref()
                            .map(|d| d.value.round())
                            .unwrap_or(UNREACHABLE_DISTANCE_M as f64),
                    );
                    trow.push(
                        element
                            .duration
                            .as_ref()
                            .map(|d| d.value.round())
                            .unwrap_or(UNREACHABLE_DURATION_S as f64),
                    );
                } else {
                    drow.push(UNREACHABLE_DISTANCE_M as f64);
                    trow.push(UNREACHABLE_DURATION_S as f64);
                }
            }
            distances.push(drow);
            durations.push(trow);
        }

        Ok(MatrixResult {
            distances,
            durations: Some(durations),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    #[tokio::test]
    async fn meters_and_seconds_pass_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/distancematrix/json"))
            .and(query_param("mode", "driving"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "rows": [
                    {"elements": [
                        {"status": "OK", "distance": {"value": 2500}, "duration": {"value": 300}},
                        {"status": "ZERO_RESULTS"}
                    ]}
                ]
            })))
            .mount(&server)
            .await;

        let adapter = GoogleMatrixAdapter::new("key".to_string(), Duration::from_secs(5))
            .with_base_url(server.uri());
        let req = MatrixRequest {
            mode: TravelMode::Driving,
            origins: vec![coord(50.85, 4.35)],
            destinations: vec![coord(50.90, 4.40), coord(0.0, 0.0)],
            parameters: Default::default(),
        };

        let result = adapter.compute(&req).await.unwrap();
        assert_eq!(result.distances[0][0], 2500.0);
        assert_eq!(result.distances[0][1], UNREACHABLE_DISTANCE_M as f64);
        assert_eq!(result.durations.unwrap()[0][0], 300.0);
    }

    #[tokio::test]
    async fn api_level_error_message_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid",
            })))
            .mount(&server)
            .await;

        let adapter = GoogleMatrixAdapter::new("key".to_string(), Duration::from_secs(5))
            .with_base_url(server.uri());
        let req = MatrixRequest::square(vec![coord(1.0, 2.0)], TravelMode::Driving);
        let err = adapter.compute(&req).await.unwrap_err();
        assert!(err.to_string().contains("API key is invalid"));
    }
}
