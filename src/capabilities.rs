//! Registry introspection payloads for `/capabilities` and `/status/*`.

use serde_json::json;

use crate::state::AppContext;

fn adapter_descriptor(name: &str) -> serde_json::Value {
    match name {
        "euclidean" => json!({
            "kind": "offline",
            "space": "planar",
            "metrics": ["distance"],
            "notes": "pairwise Euclidean over solver-space (x, y); optional meters_per_unit",
        }),
        "haversine" => json!({
            "kind": "offline",
            "space": "geographic",
            "metrics": ["distance"],
            "notes": "great-circle distances, R = 6371 km",
        }),
        "local_graph" => json!({
            "kind": "offline",
            "space": "geographic",
            "metrics": ["distance", "duration"],
            "modes": ["driving", "walking", "cycling"],
            "notes": "road graph built around the request centroid, cached per area",
        }),
        "openrouteservice" | "google" | "mapbox" => json!({
            "kind": "online",
            "space": "geographic",
            "metrics": ["distance", "duration"],
            "modes": ["driving", "walking", "cycling"],
            "requires_api_key": true,
        }),
        _ => json!({ "kind": "unknown" }),
    }
}

fn solver_descriptor(name: &str) -> serde_json::Value {
    match name {
        "localsearch" => json!({
            "kind": "metaheuristic",
            "needs": "matrix",
            "supports": ["capacity", "time_windows", "pickup_delivery", "drop", "multi_vehicle"],
            "options": ["time_limit", "allow_drop", "drop_penalty", "first_solution", "metaheuristic"],
        }),
        "milp" => json!({
            "kind": "exact",
            "needs": "matrix",
            "supports": ["capacity", "time_windows", "multi_vehicle"],
            "backend": "microlp",
        }),
        "trip" => json!({
            "kind": "coordinate",
            "needs": "waypoints_or_matrix",
            "supports": ["single_vehicle_tour"],
        }),
        _ => json!({ "kind": "unknown" }),
    }
}

/// Everything a client needs to pick an adapter and a solver.
pub fn capabilities(ctx: &AppContext) -> serde_json::Value {
    let adapters: serde_json::Map<String, serde_json::Value> = ctx
        .adapters
        .list()
        .into_iter()
        .map(|name| {
            let descriptor = adapter_descriptor(&name);
            (name, descriptor)
        })
        .collect();
    let solvers: serde_json::Map<String, serde_json::Value> = ctx
        .solvers
        .list()
        .into_iter()
        .map(|name| {
            let descriptor = solver_descriptor(&name);
            (name, descriptor)
        })
        .collect();

    json!({
        "adapters": adapters,
        "solvers": solvers,
        "formats": crate::instance::supported_extensions(),
    })
}
