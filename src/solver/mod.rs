//! Solver engines: the uniform contract every VRP algorithm is driven
//! through, plus route-building helpers shared by the engines.
//!
//! Engines never see raw requests. They receive a [`SolveInput`] whose arrays
//! are already aligned and unit-normalized, and they return a [`Routes`] with
//! per-route totals and a status message. Anything engine-specific (search
//! strategies, LP backends, fallbacks) stays behind the trait.

pub mod localsearch;
pub mod milp;
pub mod trip;

use crate::error::Result;
use crate::matrix::Matrix;
use crate::model::{
    ObjectiveWeights, PickupDeliveryPair, Route, Routes, SolveOptions, Vehicle, Waypoint,
};

/// The engine call contract, spelled out for diagnostics when an invocation
/// blows up.
pub const ENGINE_CONTRACT: &str = "solve(fleet, matrix, depot_index, demands?, \
node_time_windows?, service_times?, pickup_delivery_pairs?, weights?, waypoints?)";

/// What an engine must be given before it can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineRequirements {
    /// A canonical matrix is mandatory (auto-built Euclidean counts).
    Matrix,
    /// Either a matrix or coordinate-mode waypoints.
    MatrixOrWaypoints,
}

/// Canonical, normalized engine input.
pub struct SolveInput<'a> {
    pub fleet: &'a [Vehicle],
    pub matrix: Option<&'a Matrix>,
    pub depot_index: usize,
    pub demands: &'a [i64],
    pub node_time_windows: &'a [(i64, i64)],
    pub service_times: &'a [i64],
    pub vehicle_time_windows: &'a [(i64, i64)],
    pub pairs: &'a [PickupDeliveryPair],
    pub weights: ObjectiveWeights,
    pub waypoints: Option<&'a [Waypoint]>,
    pub options: &'a SolveOptions,
}

impl<'a> SolveInput<'a> {
    pub fn vehicle_start(&self, vehicle: &Vehicle) -> usize {
        vehicle.start.unwrap_or(self.depot_index)
    }

    pub fn vehicle_end(&self, vehicle: &Vehicle) -> usize {
        vehicle.end.unwrap_or(self.depot_index)
    }
}

/// Uniform engine interface; the registry hands out fresh boxed instances.
pub trait SolverEngine: Send + Sync {
    fn name(&self) -> &'static str;
    fn requirements(&self) -> EngineRequirements;
    fn solve(&self, input: &SolveInput) -> Result<Routes>;
}

pub type BoxedEngine = Box<dyn SolverEngine>;

// ============ Shared route assembly ============

/// Build a [`Route`] for `path` (node indices, depot included at both ends),
/// totalling distance/duration straight from the canonical matrix.
pub fn route_from_path(vehicle: &Vehicle, matrix: &Matrix, path: &[usize], status: &str) -> Route {
    let mut total_distance = 0i64;
    let mut total_duration = matrix.durations.as_ref().map(|_| 0i64);
    for leg in path.windows(2) {
        total_distance += matrix.distance(leg[0], leg[1]);
        if let (Some(total), Some(d)) = (total_duration.as_mut(), matrix.duration(leg[0], leg[1]))
        {
            *total += d;
        }
    }

    let mut metadata = serde_json::Map::new();
    metadata.insert("status".to_string(), serde_json::Value::from(status));

    Route {
        vehicle_id: vehicle.id.clone(),
        waypoint_ids: path.iter().map(|n| n.to_string()).collect(),
        total_distance: Some(total_distance as f64),
        total_duration,
        emissions: None,
        metadata: Some(metadata),
    }
}

/// The status/counts summary every engine reports.
pub fn summarize(
    status: &str,
    routes: &[Route],
    fleet_size: usize,
    n_nodes: usize,
    depot_index: usize,
    dropped: &[usize],
) -> String {
    let served: std::collections::HashSet<usize> = routes
        .iter()
        .flat_map(Route::node_indices)
        .filter(|&n| n != depot_index)
        .collect();
    let customers = n_nodes.saturating_sub(1);
    let total_distance: f64 = routes.iter().filter_map(|r| r.total_distance).sum();
    let total_duration: i64 = routes.iter().filter_map(|r| r.total_duration).sum();
    format!(
        "status={status}; vehicles_used={}/{fleet_size}; served={}/{customers}; dropped={}; \
         total_distance={total_distance:.0}; total_duration={total_duration}",
        routes.len(),
        served.len(),
        dropped.len(),
    )
}

/// Depot-only tours carry no work and are skipped from engine output.
pub fn is_depot_only(path: &[usize], start: usize, end: usize) -> bool {
    path.iter().all(|&n| n == start || n == end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_matrix() -> Matrix {
        Matrix {
            distances: vec![
                vec![0, 5, 7],
                vec![5, 0, 3],
                vec![7, 3, 0],
            ],
            durations: Some(vec![
                vec![0, 300, 420],
                vec![300, 0, 180],
                vec![420, 180, 0],
            ]),
        }
    }

    #[test]
    fn route_totals_sum_matrix_legs() {
        let route = route_from_path(
            &Vehicle::named("veh-1"),
            &toy_matrix(),
            &[0, 1, 2, 0],
            "success",
        );
        assert_eq!(route.total_distance, Some(15.0));
        assert_eq!(route.total_duration, Some(300 + 180 + 420));
        assert_eq!(route.waypoint_ids, vec!["0", "1", "2", "0"]);
    }

    #[test]
    fn summary_counts_served_and_dropped() {
        let matrix = toy_matrix();
        let routes = vec![route_from_path(
            &Vehicle::named("veh-1"),
            &matrix,
            &[0, 1, 0],
            "success",
        )];
        let message = summarize("success", &routes, 2, 3, 0, &[2]);
        assert!(message.contains("vehicles_used=1/2"));
        assert!(message.contains("served=1/2"));
        assert!(message.contains("dropped=1"));
    }

    #[test]
    fn depot_only_detection() {
        assert!(is_depot_only(&[0, 0], 0, 0));
        assert!(!is_depot_only(&[0, 1, 0], 0, 0));
    }
}
