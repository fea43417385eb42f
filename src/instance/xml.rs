//! Tolerant XML instance parser.
//!
//! Real-world XML benchmarks disagree on tag names, so discovery is fuzzy:
//! nodes live under a `nodes`/`customers`/`vertices` container possibly nested
//! inside `network`/`graph`/`data`/`instance`; the fleet under
//! `fleet`/`vehicles`/`vehicleInfo`. Depot detection checks `type="depot"`, a
//! `<depot>` child, and an `isDepot` attribute before falling back to the
//! smallest id.

use chrono::Utc;
use roxmltree::{Document, Node};

use crate::error::{Error, Result};
use crate::instance::{
    infer_vehicle_count, uniform_fleet, CoordinateSpaces, Instance, InstanceMeta,
};
use crate::matrix::euclidean::euclidean_matrix;
use crate::matrix::MatrixResult;
use crate::model::{TimeWindow, Waypoint};

fn find_child_any<'a>(parent: Node<'a, 'a>, names: &[&str]) -> Option<Node<'a, 'a>> {
    parent.children().find(|child| {
        child.is_element()
            && names
                .iter()
                .any(|name| child.tag_name().name().eq_ignore_ascii_case(name))
    })
}

fn attr_f64(node: Node, names: &[&str]) -> Option<f64> {
    for name in names {
        if let Some(value) = node.attribute(*name) {
            if let Ok(parsed) = value.trim().parse() {
                return Some(parsed);
            }
        }
    }
    None
}

fn child_text_f64(node: Node, names: &[&str]) -> Option<f64> {
    let child = find_child_any(node, names)?;
    child.text()?.trim().parse().ok()
}

fn value_f64(node: Node, names: &[&str]) -> Option<f64> {
    attr_f64(node, names).or_else(|| child_text_f64(node, names))
}

fn is_truthy(text: &str) -> bool {
    matches!(text.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

const NODE_CONTAINERS: &[&str] = &["nodes", "vertices", "vertexes", "customers"];
const NESTING: &[&str] = &["network", "graph", "data", "instance"];
const FLEET_CONTAINERS: &[&str] = &["fleet", "vehicles", "vehicleInfo", "resources"];
const NODE_TAGS: &[&str] = &["node", "vertex", "customer", "location"];

pub fn parse(text: &str, compute_matrix: bool) -> Result<Instance> {
    let doc = Document::parse(text)
        .map_err(|e| Error::InvalidInput(format!("xml: parse failure: {e}")))?;
    let root = doc.root_element();

    let nodes_parent = find_child_any(root, NODE_CONTAINERS)
        .or_else(|| {
            find_child_any(root, NESTING)
                .and_then(|nested| find_child_any(nested, NODE_CONTAINERS))
        })
        .ok_or_else(|| {
            Error::InvalidInput("xml: could not find a nodes/customers/vertices section".to_string())
        })?;

    let mut node_elements: Vec<Node> = nodes_parent
        .children()
        .filter(|c| {
            c.is_element()
                && NODE_TAGS
                    .iter()
                    .any(|t| c.tag_name().name().eq_ignore_ascii_case(t))
        })
        .collect();
    if node_elements.is_empty() {
        // Fallback: any element children at all.
        node_elements = nodes_parent.children().filter(Node::is_element).collect();
    }
    if node_elements.is_empty() {
        return Err(Error::InvalidInput("xml: nodes section appears empty".to_string()));
    }

    // First pass: ids and depot detection.
    let mut ids: Vec<i64> = Vec::with_capacity(node_elements.len());
    let mut depot_flag_index: Option<usize> = None;
    for (idx, node) in node_elements.iter().enumerate() {
        let id = value_f64(*node, &["id", "number", "index"])
            .map(|v| v as i64)
            .unwrap_or(idx as i64 + 1);
        ids.push(id);

        let mut is_depot = node
            .attribute("type")
            .map(|t| t.to_lowercase().contains("depot"))
            .unwrap_or(false);
        if !is_depot {
            if let Some(tag) = find_child_any(*node, &["depot", "isDepot"]) {
                is_depot = tag.text().map(is_truthy).unwrap_or(true);
            }
        }
        if !is_depot {
            is_depot = node.attribute("isDepot").map(is_truthy).unwrap_or(false);
        }
        if is_depot && depot_flag_index.is_none() {
            depot_flag_index = Some(idx);
        }
    }

    // Smallest id wins when nothing is marked.
    let depot_index = depot_flag_index.unwrap_or_else(|| {
        ids.iter()
            .enumerate()
            .min_by_key(|(_, id)| **id)
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    });

    // Second pass: waypoints.
    let mut waypoints: Vec<Waypoint> = Vec::with_capacity(node_elements.len());
    for (idx, node) in node_elements.iter().enumerate() {
        let x = value_f64(*node, &["x", "cx", "longitude", "lon", "long"]).unwrap_or(0.0);
        let y = value_f64(*node, &["y", "cy", "latitude", "lat"]).unwrap_or(0.0);
        let demand = value_f64(*node, &["demand", "dem", "q", "quantity"])
            .map(|v| v.round() as i64)
            .unwrap_or(0);
        let tw_start = value_f64(*node, &["ready", "twStart", "twA", "a", "open", "start"]);
        let tw_end = value_f64(*node, &["due", "twEnd", "twB", "b", "close", "end"]);
        let service = value_f64(*node, &["service", "serviceTime", "s", "duration"])
            .map(|v| v.round() as i64)
            .unwrap_or(0);

        waypoints.push(Waypoint {
            id: ids[idx].to_string(),
            x: Some(x),
            y: Some(y),
            lat: Some(x),
            lon: Some(y),
            location: None,
            demand: vec![demand],
            service_time: service,
            time_window: match (tw_start, tw_end) {
                (Some(start), Some(end)) => Some(
                    TimeWindow {
                        start: start.round() as i64,
                        end: end.round() as i64,
                    }
                    .ordered(),
                ),
                _ => None,
            },
            depot: idx == depot_index,
        });
    }

    // Fleet block.
    let fleet_parent = find_child_any(root, FLEET_CONTAINERS).or_else(|| {
        find_child_any(root, NESTING).and_then(|nested| find_child_any(nested, FLEET_CONTAINERS))
    });

    let mut vehicle_count: Option<usize> = None;
    let mut capacity: i64 = 1_000_000_000;
    if let Some(fleet) = fleet_parent {
        vehicle_count = value_f64(fleet, &["vehicles", "numVehicles", "fleetSize", "count"])
            .map(|v| v as usize)
            .filter(|&v| v > 0);
        if let Some(cap) = value_f64(fleet, &["capacity", "vehicleCapacity", "Q"]) {
            capacity = cap.round() as i64;
        } else if let Some(vehicle) = find_child_any(fleet, &["vehicle", "vehicle_profile"]) {
            if let Some(cap) = value_f64(vehicle, &["capacity", "vehicleCapacity", "Q"]) {
                capacity = cap.round() as i64;
            }
        }
    }

    let total_demand: i64 = waypoints.iter().map(|wp| wp.scalar_demand()).sum();
    let vehicle_count = vehicle_count
        .unwrap_or_else(|| infer_vehicle_count(total_demand, capacity, waypoints.len()));

    let matrix = if compute_matrix {
        let points: Vec<(f64, f64)> = waypoints
            .iter()
            .filter_map(|wp| wp.solver_xy())
            .collect();
        let distances = euclidean_matrix(&points);
        Some(MatrixResult {
            durations: Some(distances.clone()),
            distances,
        })
    } else {
        None
    };

    Ok(Instance {
        edge_weight_type: "EUC_2D".to_string(),
        coordinate_spaces: CoordinateSpaces::euclidean(),
        waypoints,
        fleet: uniform_fleet(vehicle_count, capacity, depot_index),
        depot_index,
        matrix,
        meta: InstanceMeta {
            format: "vrp-set-xml".to_string(),
            source: None,
            vehicle_count,
            capacity,
            loaded_at: Utc::now(),
        },
    })
}
