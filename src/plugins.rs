//! One-shot plugin wiring: adapters and solver engines registered by name at
//! startup.
//!
//! Registration is idempotent (re-running is a no-op) and tolerant: a missing
//! API key disables only that provider, with a log line instead of a startup
//! failure. Factories are registered, not instances, so nothing here forces
//! initialization order.

use tracing::{debug, warn};

use crate::matrix::euclidean::EuclideanAdapter;
use crate::matrix::google::GoogleMatrixAdapter;
use crate::matrix::graph::LocalGraphAdapter;
use crate::matrix::haversine::HaversineAdapter;
use crate::matrix::mapbox::MapboxMatrixAdapter;
use crate::matrix::openrouteservice::OrsAdapter;
use crate::matrix::BoxedAdapter;
use crate::solver::localsearch::LocalSearchEngine;
use crate::solver::milp::MilpEngine;
use crate::solver::trip::TripEngine;
use crate::solver::BoxedEngine;
use crate::state::AppContext;

fn safe_register_adapter<F>(ctx: &AppContext, name: &str, factory: F)
where
    F: Fn() -> BoxedAdapter + Send + Sync + 'static,
{
    if ctx.adapters.contains(name) {
        return;
    }
    if let Err(err) = ctx.adapters.register(name, factory) {
        warn!(adapter = name, %err, "adapter registration skipped");
    }
}

pub fn register_adapters(ctx: &AppContext) {
    let settings = &ctx.settings;

    // Offline / local adapters.
    safe_register_adapter(ctx, "euclidean", || Box::new(EuclideanAdapter::new()));

    if settings.enable_haversine {
        safe_register_adapter(ctx, "haversine", || Box::new(HaversineAdapter::new()));
    }

    if settings.enable_local_graph {
        let buffer = settings.local_graph_buffer_m;
        let lru = ctx.graph_lru.clone();
        safe_register_adapter(ctx, "local_graph", move || {
            Box::new(LocalGraphAdapter::new(buffer, lru.clone()))
        });
    }

    // Online providers: key missing ⇒ provider disabled, nothing else.
    let timeout = settings.http_timeout;
    match settings.ors_api_key.clone() {
        Some(key) => safe_register_adapter(ctx, "openrouteservice", move || {
            Box::new(OrsAdapter::new(key.clone(), timeout))
        }),
        None => debug!("openrouteservice disabled: no ORS_API_KEY"),
    }
    match settings.google_api_key.clone() {
        Some(key) => safe_register_adapter(ctx, "google", move || {
            Box::new(GoogleMatrixAdapter::new(key.clone(), timeout))
        }),
        None => debug!("google matrix disabled: no GOOGLE_API_KEY"),
    }
    match settings.mapbox_token.clone() {
        Some(token) => safe_register_adapter(ctx, "mapbox", move || {
            Box::new(MapboxMatrixAdapter::new(token.clone(), timeout))
        }),
        None => debug!("mapbox matrix disabled: no MAPBOX_TOKEN"),
    }
}

pub fn register_solvers(ctx: &AppContext) {
    let register = |name: &str, factory: fn() -> BoxedEngine| {
        if ctx.solvers.contains(name) {
            return;
        }
        if let Err(err) = ctx.solvers.register(name, factory) {
            warn!(solver = name, %err, "solver registration skipped");
        }
    };

    register("localsearch", || Box::new(LocalSearchEngine::new()));
    register("milp", || Box::new(MilpEngine::new()));
    register("trip", || Box::new(TripEngine::new()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::state::AppContext;

    #[test]
    fn registration_is_idempotent_and_key_gated() {
        let mut settings = Settings::default();
        settings.ors_api_key = Some("key".to_string());
        settings.google_api_key = None;
        let ctx = AppContext::new(settings);

        register_adapters(&ctx);
        register_adapters(&ctx);
        register_solvers(&ctx);
        register_solvers(&ctx);

        let adapters = ctx.adapters.list();
        assert!(adapters.contains(&"euclidean".to_string()));
        assert!(adapters.contains(&"haversine".to_string()));
        assert!(adapters.contains(&"local_graph".to_string()));
        assert!(adapters.contains(&"openrouteservice".to_string()));
        assert!(!adapters.contains(&"google".to_string()));

        assert_eq!(
            ctx.solvers.list(),
            vec!["localsearch".to_string(), "milp".to_string(), "trip".to_string()]
        );
    }
}
