//! Planar TSPLIB-style `.vrp` parser and writer.
//!
//! Header fields (`KEY : VALUE`) followed by keyed sections terminated by
//! `EOF`. Node ids are 1-based in the file; the emitted `depot_index` is
//! 0-based. Waypoints keep both the solver space (x, y) and the legacy
//! (x, y)-as-(lat, lon) aliasing. A pre-computed EDGE_WEIGHT_SECTION is
//! adopted verbatim; otherwise a Euclidean matrix is computed on request.

use std::collections::HashMap;

use chrono::Utc;

use crate::error::{Error, Result};
use crate::instance::{
    uniform_fleet, CoordinateSpaces, Instance, InstanceMeta,
};
use crate::matrix::euclidean::euclidean_matrix;
use crate::matrix::MatrixResult;
use crate::model::{TimeWindow, Waypoint};

fn tokenize_lines(text: &str) -> Vec<&str> {
    text.lines().map(|l| l.trim()).filter(|l| !l.is_empty()).collect()
}

fn section_name(line: &str) -> Option<&'static str> {
    let upper = line.to_uppercase();
    if upper.starts_with("NODE_COORD_SECTION") {
        Some("NODE_COORD")
    } else if upper.starts_with("DEMAND_SECTION") {
        Some("DEMAND")
    } else if upper.starts_with("DEPOT_SECTION") {
        Some("DEPOT")
    } else if upper.starts_with("SERVICE_TIME") {
        Some("SERVICE_TIME")
    } else if upper.starts_with("TIME_WINDOW") {
        Some("TIME_WINDOW")
    } else if upper.starts_with("EDGE_WEIGHT_SECTION") {
        Some("EDGE_WEIGHT")
    } else {
        None
    }
}

struct RawFile<'a> {
    header: HashMap<String, String>,
    sections: HashMap<&'static str, Vec<&'a str>>,
}

fn read_file<'a>(lines: &[&'a str]) -> RawFile<'a> {
    let mut header = HashMap::new();
    let mut sections: HashMap<&'static str, Vec<&str>> = HashMap::new();
    let mut current: Option<&'static str> = None;

    for &line in lines {
        if line.to_uppercase().starts_with("EOF") {
            break;
        }
        if let Some(name) = section_name(line) {
            current = Some(name);
            sections.entry(name).or_default();
            continue;
        }
        if current.is_none() {
            if let Some((key, value)) = line.split_once(':') {
                header.insert(key.trim().to_uppercase(), value.trim().to_string());
                continue;
            }
        }
        if let Some(name) = current {
            if let Some(rows) = sections.get_mut(name) {
                rows.push(line);
            }
        }
    }

    RawFile { header, sections }
}

fn parse_indexed_rows(rows: &[&str], want: usize) -> Vec<(usize, Vec<f64>)> {
    let mut out = Vec::new();
    for row in rows {
        let parts: Vec<&str> = row.split_whitespace().collect();
        if parts.len() < want + 1 {
            continue;
        }
        let Ok(idx) = parts[0].parse::<usize>() else { continue };
        let values: Vec<f64> = parts[1..=want]
            .iter()
            .filter_map(|p| p.parse().ok())
            .collect();
        if values.len() == want {
            out.push((idx, values));
        }
    }
    out
}

fn parse_depot_rows(rows: &[&str]) -> Vec<usize> {
    let mut depots = Vec::new();
    for row in rows {
        for token in row.split_whitespace() {
            if token == "-1" {
                return depots;
            }
            if let Ok(idx) = token.parse::<usize>() {
                depots.push(idx);
            }
        }
    }
    depots
}

fn parse_edge_weights(rows: &[&str], n: usize) -> Result<Vec<Vec<f64>>> {
    let flat: Vec<f64> = rows
        .iter()
        .flat_map(|row| row.split_whitespace())
        .filter_map(|tok| tok.parse().ok())
        .collect();
    if flat.len() != n * n {
        return Err(Error::InvalidInput(format!(
            "EDGE_WEIGHT_SECTION has {} values, expected {} for a {}x{} full matrix",
            flat.len(),
            n * n,
            n,
            n
        )));
    }
    Ok(flat.chunks(n).map(|chunk| chunk.to_vec()).collect())
}

pub fn parse(text: &str, compute_matrix: bool) -> Result<Instance> {
    let lines = tokenize_lines(text);
    let raw = read_file(&lines);

    let edge_weight_type = raw
        .header
        .get("EDGE_WEIGHT_TYPE")
        .map(|v| v.to_uppercase())
        .unwrap_or_else(|| "EUC_2D".to_string());
    let capacity: i64 = raw
        .header
        .get("CAPACITY")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1_000_000_000);
    let vehicle_count: usize = raw
        .header
        .get("VEHICLES")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1)
        .max(1);

    let coord_rows = raw.sections.get("NODE_COORD").map(Vec::as_slice).unwrap_or(&[]);
    let mut nodes = parse_indexed_rows(coord_rows, 2);
    if nodes.is_empty() {
        return Err(Error::InvalidInput(
            "NODE_COORD_SECTION not found or empty".to_string(),
        ));
    }
    nodes.sort_by_key(|(idx, _)| *idx);

    let demand_rows = raw.sections.get("DEMAND").map(Vec::as_slice).unwrap_or(&[]);
    let demands: HashMap<usize, i64> = parse_indexed_rows(demand_rows, 1)
        .into_iter()
        .map(|(idx, vals)| (idx, vals[0].round() as i64))
        .collect();

    let tw_rows = raw.sections.get("TIME_WINDOW").map(Vec::as_slice).unwrap_or(&[]);
    let time_windows: HashMap<usize, (i64, i64)> = parse_indexed_rows(tw_rows, 2)
        .into_iter()
        .map(|(idx, vals)| (idx, (vals[0].round() as i64, vals[1].round() as i64)))
        .collect();

    let service_rows = raw.sections.get("SERVICE_TIME").map(Vec::as_slice).unwrap_or(&[]);
    let service_times: HashMap<usize, i64> = parse_indexed_rows(service_rows, 1)
        .into_iter()
        .map(|(idx, vals)| (idx, vals[0].round() as i64))
        .collect();

    let depots = parse_depot_rows(raw.sections.get("DEPOT").map(Vec::as_slice).unwrap_or(&[]));
    let depot_index = depots.first().copied().unwrap_or(1).saturating_sub(1);

    let waypoints: Vec<Waypoint> = nodes
        .iter()
        .map(|(idx1, coords)| {
            let (x, y) = (coords[0], coords[1]);
            Waypoint {
                id: idx1.to_string(),
                x: Some(x),
                y: Some(y),
                // Legacy planar-as-geographic aliasing kept for display layers.
                lat: Some(x),
                lon: Some(y),
                location: None,
                demand: vec![demands.get(idx1).copied().unwrap_or(0)],
                service_time: service_times.get(idx1).copied().unwrap_or(0),
                time_window: time_windows
                    .get(idx1)
                    .map(|&(start, end)| TimeWindow { start, end }.ordered()),
                depot: idx1.saturating_sub(1) == depot_index,
            }
        })
        .collect();

    let n = waypoints.len();
    let matrix = if let Some(rows) = raw.sections.get("EDGE_WEIGHT") {
        let distances = parse_edge_weights(rows, n)?;
        Some(MatrixResult { distances, durations: None })
    } else if compute_matrix {
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
        edge_weight_type: edge_weight_type.clone(),
        coordinate_spaces: if edge_weight_type.starts_with("EUC") {
            CoordinateSpaces::euclidean()
        } else {
            CoordinateSpaces::geographic()
        },
        waypoints,
        fleet: uniform_fleet(vehicle_count, capacity, depot_index),
        depot_index,
        matrix,
        meta: InstanceMeta {
            format: "cvrplib".to_string(),
            source: None,
            vehicle_count,
            capacity,
            loaded_at: Utc::now(),
        },
    })
}

// ============ Writer ============

/// Emit a CVRPLIB-like `.vrp`. Parsing the output yields an instance equal to
/// the input up to section ordering.
pub fn write(instance: &Instance, name: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("NAME : {name}"));
    lines.push("TYPE : CVRP".to_string());
    lines.push(format!("DIMENSION : {}", instance.waypoints.len()));
    lines.push(format!("EDGE_WEIGHT_TYPE : {}", instance.edge_weight_type));
    lines.push(format!("CAPACITY : {}", instance.meta.capacity));
    if instance.meta.vehicle_count > 1 {
        lines.push(format!("VEHICLES : {}", instance.meta.vehicle_count));
    }

    lines.push("NODE_COORD_SECTION".to_string());
    for (i, wp) in instance.waypoints.iter().enumerate() {
        let (x, y) = wp.solver_xy().unwrap_or((0.0, 0.0));
        lines.push(format!("{} {} {}", i + 1, x, y));
    }

    lines.push("DEMAND_SECTION".to_string());
    for (i, wp) in instance.waypoints.iter().enumerate() {
        lines.push(format!("{} {}", i + 1, wp.scalar_demand()));
    }

    if instance.waypoints.iter().any(|wp| wp.time_window.is_some()) {
        lines.push("TIME_WINDOW_SECTION".to_string());
        for (i, wp) in instance.waypoints.iter().enumerate() {
            let tw = wp.time_window.unwrap_or(TimeWindow { start: 0, end: 1_000_000_000 });
            lines.push(format!("{} {} {}", i + 1, tw.start, tw.end));
        }
    }

    if instance.waypoints.iter().any(|wp| wp.service_time != 0) {
        lines.push("SERVICE_TIME_SECTION".to_string());
        for (i, wp) in instance.waypoints.iter().enumerate() {
            lines.push(format!("{} {}", i + 1, wp.service_time));
        }
    }

    lines.push("DEPOT_SECTION".to_string());
    lines.push(format!("{}", instance.depot_index + 1));
    lines.push("-1".to_string());
    lines.push("EOF".to_string());

    lines.join("\n") + "\n"
}
