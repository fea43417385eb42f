//! Result enrichment: recompute per-route totals from the canonical matrix so
//! downstream consumers see consistent numbers regardless of an engine's
//! internal units.

use crate::emissions::{estimate_kg, EmissionFactors};
use crate::matrix::Matrix;
use crate::model::{Routes, Vehicle};

/// Recompute `total_distance` (meters), `total_duration` (seconds, when the
/// matrix has durations) and emissions (kg, when the matching vehicle carries
/// a factor or a fuel type) for every route. Other fields are untouched.
pub fn enrich_routes(routes: &mut Routes, matrix: &Matrix, fleet: &[Vehicle]) {
    let factors = EmissionFactors::default();

    for route in &mut routes.routes {
        let nodes = route.node_indices();
        if nodes.len() < 2 {
            route.total_distance = Some(0.0);
            route.total_duration = matrix.durations.as_ref().map(|_| 0);
            continue;
        }

        let mut distance_m = 0i64;
        let mut duration_s = matrix.durations.as_ref().map(|_| 0i64);
        for leg in nodes.windows(2) {
            distance_m += matrix.distance(leg[0], leg[1]);
            if let (Some(total), Some(d)) = (duration_s.as_mut(), matrix.duration(leg[0], leg[1]))
            {
                *total += d;
            }
        }

        route.total_distance = Some(distance_m as f64);
        route.total_duration = duration_s;

        let vehicle = fleet.iter().find(|v| v.id == route.vehicle_id);
        route.emissions = vehicle.and_then(|v| {
            if v.emissions_per_km.is_none() && v.fuel_type.is_none() {
                return None;
            }
            let factor = factors.factor_for(v.fuel_type.as_deref(), v.emissions_per_km);
            Some(estimate_kg(distance_m as f64 / 1000.0, factor))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Route;

    fn toy_matrix() -> Matrix {
        Matrix {
            distances: vec![
                vec![0, 5000, 7000],
                vec![5000, 0, 3000],
                vec![7000, 3000, 0],
            ],
            durations: Some(vec![
                vec![0, 300, 420],
                vec![300, 0, 180],
                vec![420, 180, 0],
            ]),
        }
    }

    fn route(vehicle_id: &str, nodes: &[usize]) -> Route {
        Route {
            vehicle_id: vehicle_id.to_string(),
            waypoint_ids: nodes.iter().map(|n| n.to_string()).collect(),
            // Deliberately wrong: enrichment must overwrite these.
            total_distance: Some(1.0),
            total_duration: Some(1),
            emissions: None,
            metadata: None,
        }
    }

    #[test]
    fn totals_are_recomputed_from_the_matrix() {
        let mut routes = Routes::success("".to_string(), vec![route("veh-1", &[0, 1, 2, 0])], vec![]);
        let fleet = vec![Vehicle::named("veh-1")];
        enrich_routes(&mut routes, &toy_matrix(), &fleet);

        let r = &routes.routes[0];
        assert_eq!(r.total_distance, Some(15000.0));
        assert_eq!(r.total_duration, Some(300 + 180 + 420));
        assert!(r.emissions.is_none());
    }

    #[test]
    fn emissions_use_the_vehicle_factor() {
        let mut routes = Routes::success("".to_string(), vec![route("veh-1", &[0, 1, 0])], vec![]);
        let fleet = vec![Vehicle {
            emissions_per_km: Some(0.2),
            ..Vehicle::named("veh-1")
        }];
        enrich_routes(&mut routes, &toy_matrix(), &fleet);

        // 10 km at 0.2 kg/km.
        assert_eq!(routes.routes[0].emissions, Some(2.0));
    }

    #[test]
    fn fuel_type_falls_back_to_default_factors() {
        let mut routes = Routes::success("".to_string(), vec![route("veh-1", &[0, 1, 0])], vec![]);
        let fleet = vec![Vehicle {
            fuel_type: Some("diesel".to_string()),
            ..Vehicle::named("veh-1")
        }];
        enrich_routes(&mut routes, &toy_matrix(), &fleet);
        let kg = routes.routes[0].emissions.unwrap();
        assert!((kg - 2.7).abs() < 1e-9);
    }
}
