//! 路由模块

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_aliases))
        .route("/api/health", get(handlers::health_check))
        .route("/{alias}", get(handlers::list_metrics))
        .route("/{alias}/{metric}", get(handlers::run_metric))
        // Trailing segments beyond the metric are ignored.
        .route("/{alias}/{metric}/{*rest}", get(handlers::run_metric_nested))
}
