use axum::{Router, middleware, routing::get};
use axum_helpers::server::{create_router, health_router};
use domain_todos::{TodoService, handlers};
use observability::{metrics_handler, metrics_middleware};
use tower_http::cors::CorsLayer;

use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod health;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix will be added by the `create_router` helper.
pub fn routes(state: &AppState) -> Router {
    Router::new().nest("/todos", handlers::router(TodoService::new(state.store.clone())))
}

/// Creates a router with the /ready endpoint that checks the storage.
pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}

/// Full application: documented API under `/api`, probes and metrics.
///
/// - /health: liveness check with app name/version
/// - /ready: readiness check against the data file directory
/// - /metrics: Prometheus exposition
pub fn app(state: &AppState, cors: CorsLayer) -> Router {
    create_router::<ApiDoc>(routes(state), cors)
        .merge(health_router(state.config.app))
        .merge(ready_router(state.clone()))
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(metrics_middleware))
}
