//! Fleetroute: a Vehicle Routing Problem service.
//!
//! Pipeline:
//! - Matrix acquisition: pluggable adapters (planar, great-circle, local road
//!   graph, online providers) behind a registry, with a TTL-bounded result
//!   cache that builds each fingerprint at most once.
//! - Benchmark handling: TSPLIB-style `.vrp`, Solomon `.txt` and tolerant XML
//!   parsers emitting one canonical instance shape, plus dataset
//!   discovery/pairing.
//! - Solve dispatch: input normalization (units, array alignment, Euclidean
//!   auto-matrices, feasibility preconditions) → a named engine
//!   (metaheuristic local search, exact MIP, coordinate-mode tour) → metric
//!   enrichment from the canonical matrix.
//!
//! Key principle: engines only ever see the canonical integer matrix
//! (meters/seconds) and pre-aligned constraint arrays; everything wire-shaped
//! is reconciled at the edges.

pub mod api;
pub mod cache;
pub mod capabilities;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod emissions;
pub mod error;
pub mod instance;
pub mod matrix;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod plugins;
pub mod registry;
pub mod solver;
pub mod state;

pub use error::{Error, Result};
pub use state::AppContext;
