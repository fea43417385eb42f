//! Runtime configuration resolved from the environment.

use std::path::PathBuf;
use std::time::Duration;

/// Service settings. Constructed once at startup from the environment and
/// owned by the [`crate::state::AppContext`]; tests build their own with
/// whatever values they need.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory holding benchmark datasets (one sub-directory each).
    pub data_dir: PathBuf,
    /// Dataset folder names that are never listed as benchmarks.
    pub benchmark_exclude: Vec<String>,
    /// Per-call timeout for online matrix providers.
    pub http_timeout: Duration,
    /// Comma-separated CORS origins ("*" for permissive).
    pub cors_allow_origins: String,
    /// API keys; a missing key disables only that provider.
    pub ors_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub mapbox_token: Option<String>,
    /// Adapter feature flags.
    pub enable_haversine: bool,
    pub enable_local_graph: bool,
    /// Local graph adapter tuning.
    pub local_graph_buffer_m: u32,
    pub local_graph_network: String,
}

impl Settings {
    pub fn from_env() -> Self {
        let env_or = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };
        let key_of = |key: &str| -> Option<String> {
            std::env::var(key).ok().filter(|v| !v.trim().is_empty())
        };

        Settings {
            data_dir: PathBuf::from(env_or("DATA_DIR", "./data")),
            benchmark_exclude: vec![
                "custom_data".to_string(),
                "custom_examples".to_string(),
                "real_world".to_string(),
                "test_files".to_string(),
            ],
            http_timeout: Duration::from_secs_f64(
                env_or("HTTP_TIMEOUT_S", "15").parse().unwrap_or(15.0),
            ),
            cors_allow_origins: env_or("CORS_ALLOW_ORIGINS", "*"),
            ors_api_key: key_of("ORS_API_KEY").or_else(|| key_of("OPENROUTESERVICE_API_KEY")),
            google_api_key: key_of("GOOGLE_API_KEY"),
            mapbox_token: key_of("MAPBOX_TOKEN").or_else(|| key_of("MAPBOX_ACCESS_TOKEN")),
            enable_haversine: env_or("ENABLE_HAVERSINE", "0") == "1",
            enable_local_graph: env_or("ENABLE_LOCAL_GRAPH", "1") != "0",
            local_graph_buffer_m: env_or("LOCAL_GRAPH_BUFFER_M", "3000").parse().unwrap_or(3000),
            local_graph_network: env_or("LOCAL_GRAPH_NET", "drive"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: PathBuf::from("./data"),
            benchmark_exclude: vec!["custom_data".to_string()],
            http_timeout: Duration::from_secs(15),
            cors_allow_origins: "*".to_string(),
            ors_api_key: None,
            google_api_key: None,
            mapbox_token: None,
            enable_haversine: true,
            enable_local_graph: true,
            local_graph_buffer_m: 3000,
            local_graph_network: "drive".to_string(),
        }
    }
}
