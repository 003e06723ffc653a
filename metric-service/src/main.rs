//! 服务入口
//!
//! 加载配置与指标目录，随后启动 HTTP 监听。目录在监听开始前一次性
//! 加载，进程生命周期内只读。

use axum::{routing::get, Json};
use common::config::AppConfig;
use common::models::Catalog;
use metric_service::{handlers, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "metric-service";
const DEFAULT_PORT: u16 = 9000;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SQL 指标服务 API",
        version = "0.1.0",
        description = "按别名与指标名执行预配置 SQL 查询"
    ),
    paths(
        handlers::list_aliases,
        handlers::list_metrics,
        handlers::run_metric,
        handlers::health_check,
    ),
    components(schemas(
        common::models::DatabaseDef,
        common::models::MetricDef,
        common::models::ResultSet,
        handlers::HealthResponse,
    )),
    tags(
        (name = "metrics", description = "指标查询端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Load .env file (if present) before anything else
    load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置与指标目录
    let config = AppConfig::load(DEFAULT_PORT);
    let catalog = Catalog::from_file(&config.catalog_path)
        .expect("Failed to load catalog (check CATALOG_PATH)");

    info!(
        service = SERVICE_NAME,
        aliases = catalog.databases.len(),
        metrics = catalog.metrics.len(),
        "目录已加载"
    );

    // 创建应用状态与路由
    let addr = config.bind_address();
    let state = AppState::new(config, catalog);
    let app = metric_service::app(state).route("/api-docs/openapi.json", get(openapi_json));

    // 启动服务
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr).await.expect("绑定地址失败");
    axum::serve(listener, app).await.expect("服务启动失败");
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Load .env file from the working directory (best-effort, no error if missing).
fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    if env_path.exists() {
        if let Ok(content) = std::fs::read_to_string(env_path) {
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim();
                    // Only set if not already set by the environment
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
        }
    }
}
