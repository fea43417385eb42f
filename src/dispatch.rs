//! The two service facades.
//!
//! Solve calls walk a fixed state machine: RECEIVED (engine name resolved) →
//! NORMALIZED (canonical instance built) → ENGINE-REQUIRED-CHECK → INVOKED
//! (blocking engine run under the time budget, panics converted) → ENRICHED
//! (totals recomputed from the canonical matrix) → RETURNED. Matrix calls
//! resolve an adapter, consult the TTL cache by request fingerprint, and
//! invoke the adapter at most once per fingerprint.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::matrix::{MatrixRequest, MatrixResult};
use crate::metrics::enrich_routes;
use crate::model::{Routes, SolveRequest};
use crate::normalize::normalize;
use crate::solver::{EngineRequirements, SolveInput, ENGINE_CONTRACT};
use crate::state::AppContext;

fn request_id() -> String {
    format!("req-{:x}", chrono::Utc::now().timestamp_micros())
}

// ============ Solver facade ============

pub async fn solve(ctx: &AppContext, request: SolveRequest) -> Result<Routes> {
    let rid = request_id();

    // RECEIVED: the engine name must resolve before any work happens.
    let engine = ctx.solvers.get(&request.solver)?;
    let engine_name = request.solver.trim().to_lowercase();

    if request.fleet.vehicles.is_empty() {
        return Err(Error::InvalidInput("fleet must not be empty".to_string()));
    }

    // NORMALIZED.
    let problem = normalize(&request)?;

    // ENGINE-REQUIRED-CHECK (after the auto-build had its chance).
    match engine.requirements() {
        EngineRequirements::Matrix => {
            if problem.matrix.is_none() {
                return Err(Error::InvalidInput(format!(
                    "matrix is required for solver '{engine_name}'; provide 'matrix' or (x, y) \
                     waypoints to auto-build a Euclidean one"
                )));
            }
        }
        EngineRequirements::MatrixOrWaypoints => {
            let has_waypoints = request
                .waypoints
                .as_ref()
                .map(|w| !w.is_empty())
                .unwrap_or(false);
            if problem.matrix.is_none() && !has_waypoints {
                return Err(Error::InvalidInput(format!(
                    "solver '{engine_name}' requires either 'waypoints' (coordinate mode) or \
                     'matrix'"
                )));
            }
        }
    }

    info!(
        request_id = %rid,
        engine = %engine_name,
        nodes = problem.matrix.as_ref().map(|m| m.len()).unwrap_or(0),
        vehicles = request.fleet.vehicles.len(),
        "solve dispatched"
    );

    // INVOKED: engines are CPU-bound, run on the blocking pool with a
    // deadline backstop; panics become typed engine errors.
    let time_limit = request.options.time_limit.clamp(1, 900);
    let fleet = request.fleet.vehicles.clone();
    let waypoints = request.waypoints.clone();
    let weights = request.weights.unwrap_or_default();
    let options = request.options.clone();
    let problem_owned = problem.clone();
    let engine_label = engine_name.clone();

    let join = tokio::task::spawn_blocking(move || {
        let input = SolveInput {
            fleet: &fleet,
            matrix: problem_owned.matrix.as_ref(),
            depot_index: problem_owned.depot_index,
            demands: &problem_owned.demands,
            node_time_windows: &problem_owned.node_time_windows,
            service_times: &problem_owned.service_times,
            vehicle_time_windows: &problem_owned.vehicle_time_windows,
            pairs: &problem_owned.pairs,
            weights,
            waypoints: waypoints.as_deref(),
            options: &options,
        };
        std::panic::catch_unwind(AssertUnwindSafe(|| engine.solve(&input))).unwrap_or_else(
            |panic| {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "engine panicked".to_string());
                Err(Error::EngineInternal {
                    engine: engine_label,
                    detail: format!("panic: {detail}; expected {ENGINE_CONTRACT}"),
                })
            },
        )
    });

    let budget = Duration::from_secs(time_limit) + Duration::from_secs(10);
    let outcome = match tokio::time::timeout(budget, join).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(Error::EngineInternal {
            engine: engine_name.clone(),
            detail: format!("engine task failed: {join_err}"),
        }),
        Err(_) => Err(Error::EngineStopped {
            engine: engine_name.clone(),
            detail: format!("no result within {time_limit}s budget"),
        }),
    };

    let mut routes = outcome.map_err(|err| tag(err, &rid))?;

    // ENRICHED: only when a canonical matrix exists to recompute from.
    if let Some(matrix) = &problem.matrix {
        enrich_routes(&mut routes, matrix, &request.fleet.vehicles);
    }

    info!(request_id = %rid, routes = routes.routes.len(), "solve returned");
    Ok(routes)
}

/// Attach the request id to failures that reach the caller.
fn tag(err: Error, rid: &str) -> Error {
    match err {
        Error::EngineInternal { engine, detail } => Error::EngineInternal {
            engine,
            detail: format!("[{rid}] {detail}"),
        },
        Error::EngineStopped { engine, detail } => Error::EngineStopped {
            engine,
            detail: format!("[{rid}] {detail}"),
        },
        other => other,
    }
}

// ============ Matrix facade ============

pub async fn acquire_matrix(
    ctx: &AppContext,
    adapter_name: &str,
    request: &MatrixRequest,
) -> Result<MatrixResult> {
    // Resolve first so an unknown adapter fails fast, cache or not.
    ctx.adapters.get(adapter_name)?;

    let key = request.fingerprint(adapter_name);
    let result = ctx
        .matrix_cache
        .get_or_compute(&key, || async {
            let adapter = ctx.adapters.get(adapter_name)?;
            adapter.compute(request).await
        })
        .await;

    if let Err(err) = &result {
        warn!(adapter = adapter_name, %err, "matrix acquisition failed");
    }
    result
}
