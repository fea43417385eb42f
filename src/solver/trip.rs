//! Coordinate-mode engine: a single-vehicle tour over geographic waypoints.
//!
//! The optimizer runs nearest-neighbour construction plus 2-opt over a
//! haversine matrix built from the waypoints; the depot appears once in the
//! input and the loop is closed by appending the start at the end. When the
//! optimizer cannot produce a tour (no usable coordinates), nearest-neighbour
//! over the canonical matrix is the fallback.

use crate::error::{Error, Result};
use crate::matrix::haversine::haversine_m;
use crate::matrix::Matrix;
use crate::model::{Routes, Vehicle};
use crate::solver::{
    route_from_path, summarize, EngineRequirements, SolveInput, SolverEngine,
};

pub struct TripEngine;

impl TripEngine {
    pub fn new() -> Self {
        TripEngine
    }
}

impl Default for TripEngine {
    fn default() -> Self {
        TripEngine::new()
    }
}

/// Nearest-neighbour order over any square cost table, depot first, loop not
/// yet closed.
fn nearest_neighbour(costs: &[Vec<i64>], depot: usize) -> Vec<usize> {
    let n = costs.len();
    let mut unvisited: Vec<usize> = (0..n).filter(|&i| i != depot).collect();
    let mut order = vec![depot];
    let mut current = depot;
    while !unvisited.is_empty() {
        let (pos, &next) = unvisited
            .iter()
            .enumerate()
            .min_by_key(|(_, &j)| costs[current][j])
            .expect("unvisited is non-empty");
        order.push(next);
        unvisited.swap_remove(pos);
        current = next;
    }
    order
}

fn tour_cost(costs: &[Vec<i64>], order: &[usize]) -> i64 {
    let mut total = 0;
    for leg in order.windows(2) {
        total += costs[leg[0]][leg[1]];
    }
    if let (Some(&last), Some(&first)) = (order.last(), order.first()) {
        total += costs[last][first];
    }
    total
}

/// In-place 2-opt on the open order (position 0 pinned to the depot).
fn two_opt(costs: &[Vec<i64>], order: &mut Vec<usize>) {
    let n = order.len();
    if n < 4 {
        return;
    }
    let mut improved = true;
    while improved {
        improved = false;
        for i in 1..n - 1 {
            for j in i + 1..n {
                let before = tour_cost(costs, order);
                order[i..=j].reverse();
                if tour_cost(costs, order) < before {
                    improved = true;
                } else {
                    order[i..=j].reverse();
                }
            }
        }
    }
}

impl SolverEngine for TripEngine {
    fn name(&self) -> &'static str {
        "trip"
    }

    fn requirements(&self) -> EngineRequirements {
        EngineRequirements::MatrixOrWaypoints
    }

    fn solve(&self, input: &SolveInput) -> Result<Routes> {
        if input.fleet.len() != 1 {
            return Err(Error::InvalidInput(format!(
                "trip engine supports exactly one vehicle, got {}",
                input.fleet.len()
            )));
        }
        let vehicle: &Vehicle = &input.fleet[0];

        // Preferred path: optimize over the waypoints' geographic space.
        let geo_costs: Option<Vec<Vec<i64>>> = input.waypoints.and_then(|waypoints| {
            let coords: Vec<_> = waypoints.iter().filter_map(|wp| wp.coordinate()).collect();
            if coords.len() != waypoints.len() || coords.len() < 2 {
                return None;
            }
            Some(
                coords
                    .iter()
                    .map(|&a| {
                        coords
                            .iter()
                            .map(|&b| haversine_m(a, b).round() as i64)
                            .collect()
                    })
                    .collect(),
            )
        });

        let (costs, matrix_for_totals): (Vec<Vec<i64>>, Option<&Matrix>) = match geo_costs {
            Some(costs) => (costs, input.matrix),
            None => match input.matrix {
                // Fallback: nearest-neighbour straight over the canonical
                // matrix.
                Some(matrix) => (matrix.distances.clone(), Some(matrix)),
                None => {
                    return Err(Error::InvalidInput(
                        "trip engine requires either waypoints with coordinates or a matrix"
                            .to_string(),
                    ))
                }
            },
        };

        let n = costs.len();
        if input.depot_index >= n {
            return Err(Error::InvalidInput(format!(
                "depot_index {} out of range for {} waypoints",
                input.depot_index, n
            )));
        }

        let mut order = nearest_neighbour(&costs, input.depot_index);
        two_opt(&costs, &mut order);
        // Close the vehicle loop by appending the start.
        order.push(input.depot_index);

        let geo_matrix = Matrix {
            distances: costs,
            durations: None,
        };
        let totals_matrix = matrix_for_totals
            .filter(|m| m.len() == n)
            .unwrap_or(&geo_matrix);

        let routes = if crate::solver::is_depot_only(&order, input.depot_index, input.depot_index)
        {
            Vec::new()
        } else {
            vec![route_from_path(vehicle, totals_matrix, &order, "success")]
        };
        let message = summarize("success", &routes, 1, n, input.depot_index, &[]);
        Ok(Routes::success(message, routes, Vec::new()))
    }
}
