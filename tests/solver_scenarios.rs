//! End-to-end solve scenarios through the dispatch facade: the same request
//! contract the HTTP layer speaks, across every bundled engine.

use fleetroute::config::Settings;
use fleetroute::dispatch;
use fleetroute::model::{Routes, SolveRequest};
use fleetroute::{AppContext, Error};

fn request(body: serde_json::Value) -> SolveRequest {
    serde_json::from_value(body).unwrap()
}

async fn run(body: serde_json::Value) -> Result<Routes, Error> {
    let ctx = AppContext::with_plugins(Settings::default());
    dispatch::solve(&ctx, request(body)).await
}

fn tsp3_matrix() -> serde_json::Value {
    serde_json::json!({
        "distances": [[0, 5, 7], [5, 0, 3], [7, 3, 0]],
    })
}

fn served_customers(routes: &Routes) -> Vec<usize> {
    let mut nodes: Vec<usize> = routes
        .routes
        .iter()
        .flat_map(|r| r.node_indices())
        .filter(|&n| n != 0)
        .collect();
    nodes.sort_unstable();
    nodes.dedup();
    nodes
}

// ============ TSP-3 ============

#[tokio::test]
async fn tsp3_both_matrix_engines_find_the_15_tour() {
    for engine in ["localsearch", "milp"] {
        let routes = run(serde_json::json!({
            "solver": engine,
            "fleet": [{"id": "veh-1", "capacity": [999]}],
            "matrix": tsp3_matrix(),
            "time_limit": 10,
        }))
        .await
        .unwrap_or_else(|e| panic!("{engine}: {e}"));

        assert_eq!(routes.routes.len(), 1, "{engine}");
        assert_eq!(routes.routes[0].total_distance, Some(15.0), "{engine}");
        assert_eq!(served_customers(&routes), vec![1, 2], "{engine}");

        let nodes = routes.routes[0].node_indices();
        assert_eq!(nodes.len(), 4, "{engine}: depot + two customers + depot");
        assert_eq!(nodes[0], 0);
        assert_eq!(*nodes.last().unwrap(), 0);
    }
}

// ============ CVRP-3 ============

#[tokio::test]
async fn cvrp3_respects_capacity_with_two_vehicles() {
    for engine in ["localsearch", "milp"] {
        let routes = run(serde_json::json!({
            "solver": engine,
            "fleet": [
                {"id": "veh-1", "capacity": [5]},
                {"id": "veh-2", "capacity": [5]},
            ],
            "matrix": tsp3_matrix(),
            "demands": [0, 4, 4],
            "time_limit": 10,
        }))
        .await
        .unwrap_or_else(|e| panic!("{engine}: {e}"));

        assert_eq!(routes.routes.len(), 2, "{engine}");
        assert_eq!(served_customers(&routes), vec![1, 2], "{engine}");
        // No route may carry more than 5 units.
        for route in &routes.routes {
            let load: i64 = route
                .node_indices()
                .iter()
                .map(|&n| [0i64, 4, 4][n])
                .sum();
            assert!(load <= 5, "{engine}: route load {load}");
        }
    }
}

// ============ VRPTW-3 ============

#[tokio::test]
async fn vrptw3_serves_the_late_opening_node() {
    let routes = run(serde_json::json!({
        "solver": "localsearch",
        "fleet": [{"id": "veh-1", "capacity": [999]}],
        "matrix": {
            "distances": [[0, 5, 7], [5, 0, 3], [7, 3, 0]],
            "durations": [[0, 300, 420], [300, 0, 180], [420, 180, 0]],
        },
        "node_time_windows": [[0, 3600], [0, 3600], [600, 3600]],
        "time_limit": 10,
    }))
    .await
    .unwrap();

    assert_eq!(served_customers(&routes), vec![1, 2]);
    // Totals come from the canonical matrix after enrichment.
    let total: i64 = routes.routes.iter().filter_map(|r| r.total_duration).sum();
    assert_eq!(total, 300 + 180 + 420);
}

// ============ PDPTW-3 ============

#[tokio::test]
async fn pdptw3_pickup_precedes_delivery_in_one_tour() {
    let routes = run(serde_json::json!({
        "solver": "localsearch",
        "fleet": [
            {"id": "veh-1", "capacity": [5]},
            {"id": "veh-2", "capacity": [5]},
        ],
        "matrix": tsp3_matrix(),
        "demands": [0, 4, -4],
        "pickup_delivery_pairs": [{"pickup": 1, "delivery": 2}],
        "time_limit": 10,
    }))
    .await
    .unwrap();

    let working: Vec<_> = routes
        .routes
        .iter()
        .filter(|r| r.node_indices().iter().any(|&n| n != 0))
        .collect();
    assert_eq!(working.len(), 1, "pair must share one vehicle");
    let nodes = working[0].node_indices();
    let pickup = nodes.iter().position(|&n| n == 1).unwrap();
    let delivery = nodes.iter().position(|&n| n == 2).unwrap();
    assert!(pickup < delivery);
}

// ============ Boundary behaviors ============

#[tokio::test]
async fn single_point_matrix_yields_no_working_routes() {
    let routes = run(serde_json::json!({
        "solver": "localsearch",
        "fleet": [{"id": "veh-1"}],
        "matrix": {"distances": [[0]]},
        "time_limit": 5,
    }))
    .await
    .unwrap();
    assert!(routes.routes.is_empty());
}

#[tokio::test]
async fn tight_window_fails_at_normalization() {
    let err = run(serde_json::json!({
        "solver": "localsearch",
        "fleet": [{"id": "veh-1"}],
        "matrix": {
            "distances": [[0, 5], [5, 0]],
            "durations": [[0, 9000], [9000, 0]],
        },
        // Seconds (magnitude > 1440) and closed before the 9000s travel.
        "node_time_windows": [null, [1441, 2000]],
        "time_limit": 5,
    }))
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Infeasible(_)), "{err}");
    assert!(err.to_string().contains("node 1"));
}

#[tokio::test]
async fn capacity_shortfall_fails_at_normalization() {
    let err = run(serde_json::json!({
        "solver": "milp",
        "fleet": [{"id": "veh-1", "capacity": [5]}],
        "matrix": tsp3_matrix(),
        "demands": [0, 4, 4],
    }))
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Infeasible(_)));
}

#[tokio::test]
async fn drop_reports_unserved_nodes_instead_of_failing() {
    // Both windows are individually reachable (so normalization passes), but
    // the 5000s hop between the customers makes serving both impossible for
    // the single vehicle.
    let body = serde_json::json!({
        "solver": "localsearch",
        "fleet": [{"id": "veh-1", "capacity": [999]}],
        "matrix": {
            "distances": [[0, 5, 7], [5, 0, 3], [7, 3, 0]],
            "durations": [[0, 2000, 2000], [2000, 0, 5000], [2000, 5000, 0]],
        },
        "node_time_windows": [null, [1800, 2500], [1800, 2500]],
        "time_limit": 5,
    });

    let mut strict = body.clone();
    strict["allow_drop"] = serde_json::json!(false);
    assert!(run(strict).await.is_err(), "without drop this is unsolvable");

    let mut lenient = body;
    lenient["allow_drop"] = serde_json::json!(true);
    let routes = run(lenient).await.unwrap();

    // One customer served, the other reported dropped — never silently lost.
    let served = served_customers(&routes);
    assert_eq!(served.len(), 1);
    assert_eq!(routes.dropped.len(), 1);
    assert_ne!(routes.dropped[0], served[0]);
}

// ============ Coordinate mode ============

#[tokio::test]
async fn trip_engine_closes_the_loop_over_waypoints() {
    let routes = run(serde_json::json!({
        "solver": "trip",
        "fleet": [{"id": "veh-1"}],
        "waypoints": [
            {"id": "0", "lat": 50.85, "lon": 4.35, "depot": true},
            {"id": "1", "lat": 50.88, "lon": 4.41},
            {"id": "2", "lat": 50.82, "lon": 4.30},
        ],
    }))
    .await
    .unwrap();

    assert_eq!(routes.routes.len(), 1);
    let nodes = routes.routes[0].node_indices();
    assert_eq!(nodes[0], 0);
    assert_eq!(*nodes.last().unwrap(), 0);
    assert_eq!(served_customers(&routes), vec![1, 2]);
}

#[tokio::test]
async fn unknown_engine_and_missing_matrix_are_client_errors() {
    let unknown = run(serde_json::json!({
        "solver": "annealing",
        "fleet": [{"id": "veh-1"}],
    }))
    .await
    .unwrap_err();
    assert_eq!(unknown.status_code(), 400);

    let missing = run(serde_json::json!({
        "solver": "milp",
        "fleet": [{"id": "veh-1"}],
    }))
    .await
    .unwrap_err();
    assert_eq!(missing.status_code(), 400);
    assert!(missing.to_string().contains("matrix"));
}
