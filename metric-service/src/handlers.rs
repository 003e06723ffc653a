//! HTTP handlers.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::errors::AppError;

use crate::render::{self, OutputFormat};
use crate::service::MetricService;
use crate::state::AppState;

/// 列出所有已配置的数据库别名
#[utoipa::path(
    get,
    path = "/",
    tag = "metrics",
    responses(
        (status = 200, description = "别名列表", body = Vec<String>)
    )
)]
pub async fn list_aliases(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.aliases())
}

/// 列出某别名可用的指标及其描述
#[utoipa::path(
    get,
    path = "/{alias}",
    tag = "metrics",
    params(
        ("alias" = String, Path, description = "数据库别名")
    ),
    responses(
        (status = 200, description = "指标名到描述的映射", body = BTreeMap<String, String>),
        (status = 404, description = "别名未找到")
    )
)]
pub async fn list_metrics(
    State(state): State<AppState>,
    Path(alias): Path<String>,
) -> Result<Json<BTreeMap<String, String>>, AppError> {
    if state.catalog.database(&alias).is_none() {
        return Err(AppError::NotFound);
    }
    Ok(Json(state.catalog.metrics_for(&alias)))
}

/// 执行指标查询
///
/// 除 `json` / `text` 两个输出控制键外，任意查询串键都作为替换参数
/// 参与模板重写。
#[utoipa::path(
    get,
    path = "/{alias}/{metric}",
    tag = "metrics",
    params(
        ("alias" = String, Path, description = "数据库别名"),
        ("metric" = String, Path, description = "指标名")
    ),
    responses(
        (status = 200, description = "查询结果（JSON 数组或分号分隔文本）"),
        (status = 404, description = "别名或指标未找到"),
        (status = 500, description = "连接或查询失败")
    )
)]
pub async fn run_metric(
    State(state): State<AppState>,
    Path((alias, metric)): Path<(String, String)>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    execute(state, &alias, &metric, &params, &headers).await
}

/// Same as [`run_metric`]; extra trailing path segments are ignored.
pub async fn run_metric_nested(
    State(state): State<AppState>,
    Path((alias, metric, _rest)): Path<(String, String, String)>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    execute(state, &alias, &metric, &params, &headers).await
}

async fn execute(
    state: AppState,
    alias: &str,
    metric: &str,
    params: &[(String, String)],
    headers: &HeaderMap,
) -> Result<Response, AppError> {
    let service = MetricService::new(state.catalog.clone(), state.connections.clone());
    let rs = service.execute(alias, metric, params).await?;

    let response = match OutputFormat::negotiate(params, headers) {
        OutputFormat::Json => {
            let body = render::to_json(&rs)?;
            ([(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        OutputFormat::Text => render::to_text(&rs).into_response(),
    };
    Ok(response)
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "metric-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
