//! Input normalization: everything between a raw solve request and the
//! canonical problem an engine can trust.
//!
//! Reconciles the input shapes the wire allows — geographic vs. planar
//! coordinates, hours vs. minutes vs. seconds, float kilometers vs. integer
//! meters, sparse vs. dense constraint arrays — and validates the hard
//! preconditions before any engine burns time on an impossible instance.

use crate::error::{Error, Result};
use crate::matrix::euclidean::euclidean_matrix;
use crate::matrix::{Matrix, UNREACHABLE_DISTANCE_M, UNREACHABLE_DURATION_S};
use crate::model::{PickupDeliveryPair, SolveRequest, TimeWindow};

/// Default time-window horizon in seconds.
pub const HORIZON: i64 = 1_000_000_000;

/// The canonical problem handed to engines: integer meters, integer seconds,
/// every array aligned to the matrix size.
#[derive(Debug, Clone)]
pub struct NormalizedProblem {
    pub matrix: Option<Matrix>,
    pub depot_index: usize,
    pub demands: Vec<i64>,
    pub service_times: Vec<i64>,
    pub node_time_windows: Vec<(i64, i64)>,
    pub vehicle_time_windows: Vec<(i64, i64)>,
    pub pairs: Vec<PickupDeliveryPair>,
}

// ============ Unit reconciliation ============

/// Per-value time unit inference: ≤ 48 reads as hours, ≤ 1440 as minutes,
/// anything larger is already seconds.
pub fn to_seconds(value: i64) -> i64 {
    let magnitude = value.abs();
    if magnitude <= 48 {
        value * 3600
    } else if magnitude <= 1440 {
        value * 60
    } else {
        value
    }
}

fn window_to_seconds(window: (i64, i64)) -> (i64, i64) {
    let magnitude = window.0.abs().max(window.1.abs());
    let scale = if magnitude <= 48 {
        3600
    } else if magnitude <= 1440 {
        60
    } else {
        1
    };
    let (a, b) = (window.0 * scale, window.1 * scale);
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

/// Duration scale for auto-built Euclidean matrices: 60 when any provided
/// time window spans ≥ 20 000 (the instance already speaks seconds), else 1.
fn guess_duration_scale(windows: Option<&Vec<Option<TimeWindow>>>) -> f64 {
    let Some(windows) = windows else { return 1.0 };
    let max_span = windows
        .iter()
        .flatten()
        .filter(|tw| tw.end < HORIZON)
        .map(|tw| (tw.end - tw.start).abs())
        .max()
        .unwrap_or(0);
    if max_span >= 20_000 {
        60.0
    } else {
        1.0
    }
}

fn align<T: Copy>(input: Option<&Vec<T>>, n: usize, default: T) -> Vec<T> {
    let mut out: Vec<T> = input.map(|v| v.clone()).unwrap_or_default();
    out.truncate(n);
    while out.len() < n {
        out.push(default);
    }
    out
}

// ============ Matrix coercion ============

fn coerce_value(v: f64, sentinel: i64) -> i64 {
    if !v.is_finite() {
        return sentinel;
    }
    let rounded = v.round();
    if rounded >= sentinel as f64 {
        sentinel
    } else {
        rounded as i64
    }
}

fn canonical_matrix(
    distances: &[Vec<f64>],
    durations: Option<&Vec<Vec<f64>>>,
) -> Result<Matrix> {
    let n = distances.len();
    if n == 0 {
        return Err(Error::InvalidInput("matrix.distances is empty".to_string()));
    }
    if distances.iter().any(|row| row.len() != n) {
        return Err(Error::InvalidInput(format!(
            "distance matrix must be square; got {} rows of uneven width",
            n
        )));
    }
    if let Some(durations) = durations {
        if durations.len() != n || durations.iter().any(|row| row.len() != n) {
            return Err(Error::InvalidInput(
                "duration matrix shape mismatch with distances".to_string(),
            ));
        }
    }

    let mut dist_i: Vec<Vec<i64>> = distances
        .iter()
        .map(|row| {
            row.iter()
                .map(|&v| coerce_value(v, UNREACHABLE_DISTANCE_M))
                .collect()
        })
        .collect();
    for (i, row) in dist_i.iter_mut().enumerate() {
        row[i] = 0;
    }

    let dur_i = durations.map(|rows| {
        let mut out: Vec<Vec<i64>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&v| coerce_value(v, UNREACHABLE_DURATION_S))
                    .collect()
            })
            .collect();
        for (i, row) in out.iter_mut().enumerate() {
            row[i] = 0;
        }
        out
    });

    Ok(Matrix {
        distances: dist_i,
        durations: dur_i,
    })
}

/// Square Euclidean matrix from planar waypoints, durations scaled per the
/// heuristic (or the explicit `duration_scale` option, which wins).
fn auto_matrix(request: &SolveRequest) -> Option<Result<Matrix>> {
    let waypoints = request.waypoints.as_ref()?;
    // Only explicit planar fields count; geographic waypoints must not be
    // misread as EUC_2D.
    let points: Vec<(f64, f64)> = waypoints
        .iter()
        .filter_map(|wp| match (wp.x, wp.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        })
        .collect();
    // Build only when most waypoints actually carry a planar position.
    if points.is_empty() || points.len() * 2 < waypoints.len() {
        return None;
    }

    let scale = request
        .options
        .duration_scale
        .unwrap_or_else(|| guess_duration_scale(request.node_time_windows.as_ref()));

    let distances = euclidean_matrix(&points);
    let durations: Vec<Vec<f64>> = distances
        .iter()
        .map(|row| row.iter().map(|d| (d * scale).round()).collect())
        .collect();
    Some(canonical_matrix(&distances, Some(&durations)))
}

// ============ Entry point ============

pub fn normalize(request: &SolveRequest) -> Result<NormalizedProblem> {
    if request.fleet.vehicles.is_empty() {
        return Err(Error::InvalidInput("fleet must not be empty".to_string()));
    }

    let matrix = match &request.matrix {
        Some(wire) => Some(canonical_matrix(&wire.distances, wire.durations.as_ref())?),
        None => match auto_matrix(request) {
            Some(built) => Some(built?),
            None => None,
        },
    };

    let vehicle_count = request.fleet.vehicles.len();
    let vehicle_windows_raw: Vec<(i64, i64)> = request
        .fleet
        .vehicles
        .iter()
        .map(|v| {
            v.time_window
                .map(|tw| (tw.start, tw.end))
                .unwrap_or((0, HORIZON))
        })
        .collect();
    let vehicle_time_windows: Vec<(i64, i64)> = vehicle_windows_raw
        .into_iter()
        .map(window_to_seconds)
        .collect();

    let Some(matrix) = matrix else {
        // Coordinate-mode engines run without a matrix; nothing to align.
        return Ok(NormalizedProblem {
            matrix: None,
            depot_index: request.depot_index,
            demands: Vec::new(),
            service_times: Vec::new(),
            node_time_windows: Vec::new(),
            vehicle_time_windows,
            pairs: request.pickup_delivery_pairs.clone().unwrap_or_default(),
        });
    };

    let n = matrix.len();
    if request.depot_index >= n {
        return Err(Error::InvalidInput(format!(
            "depot_index {} out of range for {} nodes",
            request.depot_index, n
        )));
    }
    let depot_index = request.depot_index;

    let demands = align(request.demands.as_ref(), n, 0);
    let service_times: Vec<i64> = align(request.node_service_times.as_ref(), n, 0)
        .into_iter()
        .map(to_seconds)
        .collect();

    let windows_raw: Vec<(i64, i64)> = {
        let provided = request.node_time_windows.as_ref();
        (0..n)
            .map(|i| {
                provided
                    .and_then(|v| v.get(i).copied().flatten())
                    .map(|tw| (tw.start, tw.end))
                    .unwrap_or((0, HORIZON))
            })
            .collect()
    };
    let node_time_windows: Vec<(i64, i64)> =
        windows_raw.into_iter().map(window_to_seconds).collect();

    // Hard preconditions.
    let total_demand: i64 = demands.iter().filter(|&&d| d > 0).sum();
    let total_capacity: i64 = request
        .fleet
        .vehicles
        .iter()
        .map(|v| v.scalar_capacity().max(0))
        .fold(0i64, |acc, c| acc.saturating_add(c));
    if total_demand > total_capacity {
        return Err(Error::Infeasible(format!(
            "total demand {total_demand} exceeds total vehicle capacity {total_capacity} \
             ({vehicle_count} vehicles); increase capacity or add vehicles"
        )));
    }

    for (i, &(_, latest)) in node_time_windows.iter().enumerate() {
        if i == depot_index || latest >= HORIZON {
            continue;
        }
        let travel = matrix.travel_time(depot_index, i);
        if travel < UNREACHABLE_DURATION_S && latest < travel {
            return Err(Error::Infeasible(format!(
                "node {i}: latest arrival {latest}s is earlier than the shortest travel \
                 {travel}s from the depot"
            )));
        }
    }

    let pairs = request.pickup_delivery_pairs.clone().unwrap_or_default();
    for pair in &pairs {
        if pair.pickup >= n || pair.delivery >= n {
            return Err(Error::InvalidInput(format!(
                "pickup/delivery pair ({}, {}) out of range for {} nodes",
                pair.pickup, pair.delivery, n
            )));
        }
        if pair.pickup == pair.delivery {
            return Err(Error::InvalidInput(format!(
                "pickup/delivery pair may not pair node {} with itself",
                pair.pickup
            )));
        }
        if pair.pickup == depot_index || pair.delivery == depot_index {
            return Err(Error::InvalidInput(
                "pickup/delivery pairs may not reference the depot".to_string(),
            ));
        }
    }

    Ok(NormalizedProblem {
        matrix: Some(matrix),
        depot_index,
        demands,
        service_times,
        node_time_windows,
        vehicle_time_windows,
        pairs,
    })
}
