//! SQL 指标查询服务
//!
//! 通过 HTTP 暴露预配置的 SQL 查询（指标），包括：
//! - 按别名/指标名执行查询模板
//! - 模板参数重写（内联与绑定占位符）
//! - 每别名惰性连接缓存与存活探测
//! - JSON / 分号分隔文本两种输出

pub mod connection_manager;
pub mod drivers;
pub mod handlers;
pub mod query_builder;
pub mod render;
pub mod routes;
pub mod service;
pub mod state;

use axum::{middleware, Router};
use common::middleware::request_id::request_id_middleware;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Builds the fully-layered application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::router()
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
