//! HTTP API handlers with Axum and Utoipa.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::capabilities::capabilities;
use crate::dispatch;
use crate::error::Error;
use crate::instance::index::{DatasetInfo, FileEntry, FilePage, ListQuery, Pair};
use crate::instance::load_instance;
use crate::matrix::{MatrixRequestWire, MatrixResult};
use crate::model::{Route, Routes, SolveRequest};
use crate::state::AppContext;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(health, distance_matrix, benchmarks, benchmark_files, benchmark_find),
    components(schemas(
        MatrixRequestWire,
        MatrixResult,
        Route,
        Routes,
        DatasetInfo,
        FileEntry,
        FilePage,
        Pair,
        ErrorBody
    )),
    info(
        title = "Fleetroute API",
        description = "Vehicle routing service with pluggable matrix providers and VRP engines"
    )
)]
struct ApiDoc;

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorBody {
    pub status: String,
    pub error: String,
    pub detail: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let slug = match &self {
            Error::InvalidInput(_) => "invalid_input",
            Error::NotFound(_) => "not_found",
            Error::UnknownPlugin(_) => "unknown_plugin",
            Error::MatrixProvider(_) => "matrix_provider_failure",
            Error::Infeasible(_) => "infeasible_instance",
            Error::EngineInternal { .. } => "engine_internal",
            Error::EngineStopped { .. } => "engine_stopped",
            Error::Io(_) => "io_error",
        };
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            status: "error".to_string(),
            error: slug.to_string(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the Axum router
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let cors = cors_layer(&ctx.settings.cors_allow_origins);

    Router::new()
        .route("/health", get(health))
        .route("/distance-matrix", post(distance_matrix))
        .route("/solver", post(solver))
        .route("/benchmarks", get(benchmarks))
        .route("/benchmarks/files", get(benchmark_files))
        .route("/benchmarks/find", get(benchmark_find))
        .route("/benchmarks/load", get(benchmark_load))
        .route("/status/adapters", get(status_adapters))
        .route("/status/solvers", get(status_solvers))
        .route("/capabilities", get(capabilities_handler))
        .route("/api-docs/openapi.json", get(openapi))
        .layer(cors)
        .with_state(ctx)
}

fn cors_layer(origins: &str) -> CorsLayer {
    if origins.trim() == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|o| o.trim().parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub async fn serve(ctx: Arc<AppContext>, port: u16) -> anyhow::Result<()> {
    let app = build_router(ctx);
    let addr = format!("0.0.0.0:{port}");
    tracing::info!(%addr, "server starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Health & docs ============

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is healthy"))
)]
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn openapi() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============ Matrix endpoint ============

/// Compute a distance matrix through a named adapter
#[utoipa::path(
    post,
    path = "/distance-matrix",
    request_body = MatrixRequestWire,
    responses(
        (status = 200, description = "Matrix computed"),
        (status = 400, description = "Bad request", body = ErrorBody),
        (status = 502, description = "Upstream provider failure", body = ErrorBody),
    )
)]
async fn distance_matrix(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, Error> {
    // Manual decode so a missing field is a 400, not a framework 422.
    let wire: MatrixRequestWire = serde_json::from_value(body)
        .map_err(|e| Error::InvalidInput(format!("bad matrix request: {e}")))?;
    let (adapter, request) = wire.into_request()?;
    let matrix = dispatch::acquire_matrix(&ctx, &adapter, &request).await?;
    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "matrix": matrix },
    })))
}

// ============ Solver endpoint ============

async fn solver(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, Error> {
    let request: SolveRequest = serde_json::from_value(body)
        .map_err(|e| Error::InvalidInput(format!("bad solve request: {e}")))?;
    let routes = dispatch::solve(&ctx, request).await?;
    Ok(Json(serde_json::json!({
        "status": routes.status.clone(),
        "message": routes.message.clone(),
        "data": routes,
    })))
}

// ============ Benchmarks ============

/// List datasets under the data root
#[utoipa::path(
    get,
    path = "/benchmarks",
    responses((status = 200, description = "Dataset list"))
)]
async fn benchmarks(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    let datasets = ctx.index.list_datasets();
    Json(serde_json::json!({
        "status": "success",
        "data": { "datasets": datasets },
    }))
}

#[derive(Debug, Deserialize)]
struct FilesParams {
    dataset: Option<String>,
    q: Option<String>,
    /// Comma-separated extension list, dots optional.
    exts: Option<String>,
    kind: Option<String>,
    sort: Option<String>,
    order: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

/// Paginated file listing for one dataset
#[utoipa::path(
    get,
    path = "/benchmarks/files",
    params(
        ("dataset" = String, Query, description = "Dataset name"),
        ("q" = Option<String>, Query, description = "Substring filter"),
        ("exts" = Option<String>, Query, description = "Comma-separated extensions"),
        ("kind" = Option<String>, Query, description = "instances | solutions"),
        ("sort" = Option<String>, Query, description = "name | size"),
        ("order" = Option<String>, Query, description = "asc | desc"),
        ("limit" = Option<usize>, Query, description = "Page size"),
        ("offset" = Option<usize>, Query, description = "Page offset"),
    ),
    responses(
        (status = 200, description = "File page", body = FilePage),
        (status = 404, description = "Unknown dataset", body = ErrorBody),
    )
)]
async fn benchmark_files(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<FilesParams>,
) -> Result<Json<serde_json::Value>, Error> {
    let dataset = params
        .dataset
        .ok_or_else(|| Error::InvalidInput("query parameter 'dataset' is required".to_string()))?;
    let query = ListQuery {
        q: params.q,
        exts: params
            .exts
            .map(|e| e.split(',').map(|s| s.trim().to_string()).collect()),
        kind: params.kind,
        sort: params.sort,
        order: params.order,
        limit: params.limit,
        offset: params.offset,
    };
    let page = ctx.index.list_files(&dataset, &query)?;
    Ok(Json(serde_json::json!({
        "status": "success",
        "data": page,
    })))
}

#[derive(Debug, Deserialize)]
struct FindParams {
    dataset: Option<String>,
    name: Option<String>,
    compute_matrix: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, Error> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("query parameter '{name}' is required")))
}

/// Find an instance + solution pair by base name
#[utoipa::path(
    get,
    path = "/benchmarks/find",
    params(
        ("dataset" = String, Query, description = "Dataset name"),
        ("name" = String, Query, description = "Instance base name, extension optional"),
    ),
    responses(
        (status = 200, description = "Pair (solution may be null)", body = Pair),
        (status = 404, description = "Unknown dataset", body = ErrorBody),
    )
)]
async fn benchmark_find(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<FindParams>,
) -> Result<Json<serde_json::Value>, Error> {
    let dataset = required(&params.dataset, "dataset")?;
    let name = required(&params.name, "name")?;
    let pair = ctx.index.find_pair(dataset, name)?;
    Ok(Json(serde_json::json!({
        "status": "success",
        "data": pair,
    })))
}

async fn benchmark_load(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<FindParams>,
) -> Result<Json<serde_json::Value>, Error> {
    let dataset = required(&params.dataset, "dataset")?;
    let name = required(&params.name, "name")?;
    let compute_matrix = params
        .compute_matrix
        .as_deref()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(true);

    let pair = ctx.index.find_pair(dataset, name)?;
    let entry = pair
        .instance
        .ok_or_else(|| Error::NotFound(format!("instance '{name}' in dataset '{dataset}'")))?;
    let instance = load_instance(std::path::Path::new(&entry.entry.abspath), compute_matrix)?;

    let solution = match &pair.solution {
        Some(found) => Some(crate::instance::solution::parse(&std::fs::read_to_string(
            &found.entry.abspath,
        )?)?),
        None => None,
    };

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "instance": instance,
            "solution": solution,
        },
    })))
}

// ============ Registry introspection ============

async fn status_adapters(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "success",
        "data": { "adapters": ctx.adapters.list() },
    }))
}

async fn status_solvers(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "success",
        "data": { "solvers": ctx.solvers.list() },
    }))
}

async fn capabilities_handler(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "success",
        "data": capabilities(&ctx),
    }))
}
