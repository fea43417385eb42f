//! Benchmark instance handling: parsers for the three canonical input shapes
//! (planar TSPLIB-style `.vrp`, Solomon `.txt`, tolerant XML), solution files,
//! and the dataset index used to discover and pair them.
//!
//! Every parser emits the same canonical [`Instance`], so downstream code
//! never cares which file format a problem came from.

pub mod index;
pub mod solomon;
pub mod solution;
pub mod vrplib;
pub mod xml;

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::MatrixResult;
use crate::model::{Fleet, Vehicle, Waypoint};

// ============ Canonical instance ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub fields: Vec<String>,
}

/// Which coordinate space engines should use (solver) and which display
/// layers should use. Kept on every instance because benchmark files mix
/// planar (x, y) with geographic (lat, lon).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinateSpaces {
    pub solver: SpaceSpec,
    pub display: SpaceSpec,
}

impl CoordinateSpaces {
    pub fn euclidean() -> Self {
        CoordinateSpaces {
            solver: SpaceSpec {
                kind: "euclidean".to_string(),
                fields: vec!["x".to_string(), "y".to_string()],
            },
            display: SpaceSpec {
                kind: "wgs84".to_string(),
                fields: vec!["lon".to_string(), "lat".to_string()],
            },
        }
    }

    pub fn geographic() -> Self {
        CoordinateSpaces {
            solver: SpaceSpec {
                kind: "wgs84".to_string(),
                fields: vec!["lon".to_string(), "lat".to_string()],
            },
            display: SpaceSpec {
                kind: "wgs84".to_string(),
                fields: vec!["lon".to_string(), "lat".to_string()],
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceMeta {
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub vehicle_count: usize,
    pub capacity: i64,
    pub loaded_at: DateTime<Utc>,
}

/// The canonical parsed problem every loader produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub edge_weight_type: String,
    pub coordinate_spaces: CoordinateSpaces,
    pub waypoints: Vec<Waypoint>,
    pub fleet: Fleet,
    pub depot_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<MatrixResult>,
    pub meta: InstanceMeta,
}

/// Identical vehicles `veh-1..veh-n`, all starting and ending at the depot.
pub fn uniform_fleet(count: usize, capacity: i64, depot_index: usize) -> Fleet {
    let vehicles = (0..count.max(1))
        .map(|i| Vehicle {
            id: format!("veh-{}", i + 1),
            capacity: Some(vec![capacity]),
            start: Some(depot_index),
            end: Some(depot_index),
            time_window: None,
            emissions_per_km: None,
            fuel_type: None,
        })
        .collect();
    Fleet { vehicles }
}

/// `⌈Σ demand / capacity⌉` clamped to `[1, n]` — the fallback when a file
/// does not state its fleet size.
pub fn infer_vehicle_count(demands_total: i64, capacity: i64, n_nodes: usize) -> usize {
    if capacity <= 0 || demands_total <= 0 {
        return 1;
    }
    let needed = (demands_total + capacity - 1) / capacity;
    (needed.max(1) as usize).min(n_nodes.max(1))
}

// ============ Format dispatch ============

/// Extensions the instance loaders understand.
pub fn supported_extensions() -> Vec<&'static str> {
    vec![".txt", ".vrp", ".xml"]
}

fn looks_like_solomon(head: &str) -> bool {
    let upper = head.to_uppercase();
    upper.contains("VEHICLE") && (upper.contains("CUSTOMER") || upper.contains("CUST"))
}

/// Load any supported benchmark file, sniffing the actual shape when the
/// extension is ambiguous (plenty of `.vrp`/`.txt` files are really Solomon
/// or XML underneath).
pub fn load_instance(path: &Path, compute_matrix: bool) -> Result<Instance> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(format!("{}", path.display())),
        _ => Error::Io(e),
    })?;

    let mut instance = if ext == "xml" || text.trim_start().starts_with('<') {
        xml::parse(&text, compute_matrix)?
    } else if looks_like_solomon(&text.chars().take(500).collect::<String>()) {
        solomon::parse(&text, compute_matrix)?
    } else {
        vrplib::parse(&text, compute_matrix)?
    };
    instance.meta.source = Some(path.display().to_string());
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_count_inference_clamps_to_node_count() {
        assert_eq!(infer_vehicle_count(80, 10, 100), 8);
        assert_eq!(infer_vehicle_count(80, 10, 3), 3);
        assert_eq!(infer_vehicle_count(0, 10, 5), 1);
        assert_eq!(infer_vehicle_count(80, 0, 5), 1);
        assert_eq!(infer_vehicle_count(1, 1000, 5), 1);
    }

    #[test]
    fn uniform_fleet_anchors_vehicles_at_the_depot() {
        let fleet = uniform_fleet(2, 100, 3);
        assert_eq!(fleet.vehicles.len(), 2);
        assert_eq!(fleet.vehicles[0].id, "veh-1");
        assert_eq!(fleet.vehicles[0].start, Some(3));
        assert_eq!(fleet.vehicles[1].end, Some(3));
        assert_eq!(fleet.vehicles[0].capacity, Some(vec![100]));
    }
}
