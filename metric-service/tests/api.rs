//! End-to-end tests driving the real router against a SQLite database.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

use common::config::AppConfig;
use common::models::Catalog;
use metric_service::drivers::driver_for;
use metric_service::AppState;

/// Seeds a throwaway SQLite database and returns the app plus the tempdir
/// keeping the database file alive.
async fn test_app() -> (axum::Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("orders.db");
    let dsn = format!("sqlite:{}?mode=rwc", db_path.display());

    let driver = driver_for("sqlite").unwrap();
    let seed = driver.open(&dsn).await.unwrap();
    seed.query("CREATE TABLE orders (id INTEGER, amount REAL)", &[])
        .await
        .unwrap();
    seed.query(
        "INSERT INTO orders (id, amount) VALUES \
         (42, 1.25), (42, 1.25), (42, 1.25), (42, 1.25), \
         (42, 1.25), (42, 1.25), (42, 1.25), (7, 10.5)",
        &[],
    )
    .await
    .unwrap();

    let catalog = Catalog::parse(&format!(
        r#"{{
            "databases": {{
                "sales": {{
                    "driver": "sqlite",
                    "dsn": "{dsn}",
                    "metrics": ["count", "one", "empty", "nulls", "boom", "ghost"]
                }},
                "down": {{
                    "driver": "sqlite",
                    "dsn": "sqlite:/no/such/directory/db.sqlite",
                    "metrics": ["count"]
                }}
            }},
            "metrics": {{
                "count": {{
                    "query": "SELECT COUNT(*) AS n FROM #table WHERE id=$id",
                    "description": "row count"
                }},
                "one": {{
                    "query": "SELECT id, amount FROM orders WHERE id=$id ORDER BY id",
                    "description": "single order"
                }},
                "empty": {{
                    "query": "SELECT id FROM orders WHERE id < 0",
                    "description": "never matches"
                }},
                "nulls": {{
                    "query": "SELECT NULL AS a, 'x' AS b",
                    "description": "null rendering"
                }},
                "boom": {{
                    "query": "SELECT * FROM no_such_table",
                    "description": "always fails"
                }},
                "hidden": {{
                    "query": "SELECT 1 AS x",
                    "description": "not allowed for sales"
                }}
            }}
        }}"#
    ))
    .unwrap();

    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        catalog_path: String::new(),
    };
    (metric_service::app(AppState::new(config, catalog)), dir)
}

async fn get(app: axum::Router, uri: &str, accept: Option<&str>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().uri(uri);
    if let Some(accept) = accept {
        builder = builder.header(header::ACCEPT, accept);
    }
    let response = app
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

#[tokio::test]
async fn root_lists_aliases() {
    let (app, _dir) = test_app().await;
    let (status, body) = get(app, "/", None).await;
    assert_eq!(status, StatusCode::OK);

    let mut aliases: Vec<String> = serde_json::from_slice(&body).unwrap();
    aliases.sort();
    assert_eq!(aliases, vec!["down".to_string(), "sales".to_string()]);
}

#[tokio::test]
async fn alias_lists_metric_descriptions() {
    let (app, _dir) = test_app().await;
    let (status, body) = get(app, "/sales", None).await;
    assert_eq!(status, StatusCode::OK);

    let listing: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(listing["count"], json!("row count"));
    // Allowed but undefined metrics are skipped, globals not allowed for
    // the alias never appear.
    assert!(listing.get("ghost").is_none());
    assert!(listing.get("hidden").is_none());
}

#[tokio::test]
async fn unknown_alias_is_404() {
    let (app, _dir) = test_app().await;
    let (status, body) = get(app, "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"NOT_FOUND");

    let (app, _dir) = test_app().await;
    let (status, _) = get(app, "/nope/count", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metric_not_allowed_for_alias_is_404() {
    let (app, _dir) = test_app().await;
    let (status, body) = get(app, "/sales/hidden", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"NOT_FOUND");
}

#[tokio::test]
async fn executes_metric_with_inline_and_bound_substitution() {
    let (app, _dir) = test_app().await;
    let (status, body) = get(
        app,
        "/sales/count?table=orders&id=42",
        Some("application/json"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([{"n": 7}]));
}

#[tokio::test]
async fn text_flag_renders_delimited_text() {
    let (app, _dir) = test_app().await;
    let (status, body) = get(app, "/sales/one?id=7&text", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), "7;10.5");
}

#[tokio::test]
async fn accept_text_prefix_selects_text_output() {
    let (app, _dir) = test_app().await;
    let (status, body) = get(app, "/sales/nulls", Some("text/plain")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), "null;x");
}

#[tokio::test]
async fn empty_result_renders_per_format() {
    let (app, _dir) = test_app().await;
    let (status, body) = get(app, "/sales/empty", Some("application/json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"[]");

    let (app, _dir) = test_app().await;
    let (status, body) = get(app, "/sales/empty?text", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn trailing_path_segments_are_ignored() {
    let (app, _dir) = test_app().await;
    let (status, body) = get(app, "/sales/empty/extra/segments", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"[]");
}

#[tokio::test]
async fn query_failure_is_500_sql_error() {
    let (app, _dir) = test_app().await;
    let (status, body) = get(app, "/sales/boom", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"SQL_ERROR");
}

#[tokio::test]
async fn connection_failure_is_500_econnrefused() {
    let (app, _dir) = test_app().await;
    let (status, body) = get(app, "/down/count", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"ECONNREFUSED");
}
