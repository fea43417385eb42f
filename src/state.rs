//! Process-wide application context.
//!
//! Registries, the matrix TTL cache, and the graph LRU are process-lifetime
//! objects, but they are owned by an explicitly constructed context rather
//! than ambient singletons: a test builds its own `AppContext` with whatever
//! settings it needs and nothing leaks between tests.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::config::Settings;
use crate::instance::index::DatasetIndex;
use crate::matrix::graph::GraphLru;
use crate::matrix::{BoxedAdapter, MatrixResult};
use crate::registry::Registry;
use crate::solver::BoxedEngine;

pub struct AppContext {
    pub settings: Settings,
    pub adapters: Registry<BoxedAdapter>,
    pub solvers: Registry<BoxedEngine>,
    pub matrix_cache: TtlCache<MatrixResult>,
    pub graph_lru: Arc<GraphLru>,
    pub index: DatasetIndex,
}

impl AppContext {
    /// Bare context with empty registries; callers decide which plugins to
    /// load (the server loads all of them, tests usually a subset).
    pub fn new(settings: Settings) -> Arc<Self> {
        let index = DatasetIndex::new(settings.data_dir.clone(), settings.benchmark_exclude.clone());
        Arc::new(AppContext {
            settings,
            adapters: Registry::new("adapter"),
            solvers: Registry::new("solver"),
            matrix_cache: TtlCache::new(Duration::from_secs(60), 1000),
            graph_lru: Arc::new(GraphLru::new(64)),
            index,
        })
    }

    /// Context with every available adapter and solver registered — what the
    /// server boots with.
    pub fn with_plugins(settings: Settings) -> Arc<Self> {
        let ctx = Self::new(settings);
        crate::plugins::register_adapters(&ctx);
        crate::plugins::register_solvers(&ctx);
        ctx
    }
}
