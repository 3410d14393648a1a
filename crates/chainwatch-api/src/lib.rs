//! chainwatch-api — HTTP surface of the side-car.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus exposition of the gauge registry |
//! | GET | `/health/alive` | Always `200 OK` while the process runs |
//! | GET | `/health/ready` | `200 OK` or `500 error: syncing` from a live readiness check |
//!
//! No route requires authentication and no handler ever returns
//! internal error text.

pub mod handlers;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use chainwatch_health::ReadinessProbe;
use chainwatch_metrics::GaugeRegistry;

/// Shared state for the handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<GaugeRegistry>,
    pub readiness: ReadinessProbe,
}

/// Build the router serving metrics and health endpoints.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/health/alive", get(handlers::alive))
        .route("/health/ready", get(handlers::ready))
        .with_state(state)
}
