//! PostgreSQL backend.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use common::errors::{AppError, AppResult};
use common::models::ResultSet;
use serde_json::Value;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column, Connection, Executor, Row, Statement, TypeInfo};
use tokio::sync::Mutex;

use super::{DbConnection, Driver};

/// PostgreSQL driver, selected by the catalog names `postgres` / `postgresql`.
pub struct PostgresDriver;

#[async_trait]
impl Driver for PostgresDriver {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    async fn open(&self, dsn: &str) -> AppResult<Box<dyn DbConnection>> {
        let conn = PgConnection::connect(dsn)
            .await
            .map_err(|e| AppError::ConnectionRefused(e.to_string()))?;
        Ok(Box::new(PgHandle {
            conn: Mutex::new(conn),
        }))
    }
}

struct PgHandle {
    conn: Mutex<PgConnection>,
}

#[async_trait]
impl DbConnection for PgHandle {
    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.lock().await;
        conn.ping()
            .await
            .map_err(|e| AppError::ConnectionRefused(e.to_string()))
    }

    async fn query(&self, sql: &str, params: &[String]) -> AppResult<ResultSet> {
        let mut conn = self.conn.lock().await;
        let stmt = (&mut *conn)
            .prepare(sql)
            .await
            .map_err(|e| AppError::Sql(e.to_string()))?;

        let columns = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut query = stmt.query();
        for param in params {
            query = match classify(param) {
                PgValue::Int(v) => query.bind(v),
                PgValue::Float(v) => query.bind(v),
                PgValue::Bool(v) => query.bind(v),
                PgValue::Text(v) => query.bind(v),
            };
        }
        let rows = query
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| AppError::Sql(e.to_string()))?;

        let rows = rows.iter().map(decode_row).collect();
        Ok(ResultSet::new(columns, rows))
    }
}

/// Typed view of one positional parameter.
#[derive(Debug, PartialEq)]
enum PgValue<'a> {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(&'a str),
}

/// Postgres resolves parameter types at statement preparation, so a
/// TEXT-typed bind against a numeric column fails with "operator does not
/// exist". Parameters arrive as query-string text; bind each one with the
/// narrowest type it parses as and leave everything else text.
fn classify(param: &str) -> PgValue<'_> {
    if let Ok(v) = param.parse::<i64>() {
        PgValue::Int(v)
    } else if let Ok(v) = param.parse::<f64>() {
        PgValue::Float(v)
    } else if let Ok(v) = param.parse::<bool>() {
        PgValue::Bool(v)
    } else {
        PgValue::Text(param)
    }
}

fn decode_row(row: &PgRow) -> Vec<Value> {
    (0..row.columns().len())
        .map(|idx| decode_column(row, idx))
        .collect()
}

fn decode_column(row: &PgRow, idx: usize) -> Value {
    match row.column(idx).type_info().name() {
        "BOOL" => row
            .try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "INT2" | "INT4" | "INT8" => row
            .try_get::<Option<i64>, _>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::from(v as f64))
            .unwrap_or(Value::Null),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "CHAR" | "VARCHAR" | "TEXT" | "BPCHAR" | "NAME" => row
            .try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_rfc3339()))
            .unwrap_or(Value::Null),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        "JSON" | "JSONB" => row
            .try_get::<Option<Value>, _>(idx)
            .ok()
            .flatten()
            .unwrap_or(Value::Null),
        // Raw binary decodes to its textual form.
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
            .unwrap_or(Value::Null),
        // NUMERIC and anything else: fall back through the common decodes.
        _ => {
            if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
                Value::from(v)
            } else if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
                Value::from(v)
            } else if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
                Value::String(v)
            } else if let Ok(Some(v)) = row.try_get::<Option<Vec<u8>>, _>(idx) {
                Value::String(String::from_utf8_lossy(&v).into_owned())
            } else {
                Value::Null
            }
        }
    }
}
