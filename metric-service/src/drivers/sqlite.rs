//! SQLite backend.

use async_trait::async_trait;
use common::errors::{AppError, AppResult};
use common::models::ResultSet;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Executor, Row, Statement, TypeInfo};
use tokio::sync::Mutex;

use super::{DbConnection, Driver};

/// SQLite driver, selected by the catalog names `sqlite` / `sqlite3`.
pub struct SqliteDriver;

#[async_trait]
impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    async fn open(&self, dsn: &str) -> AppResult<Box<dyn DbConnection>> {
        let conn = SqliteConnection::connect(dsn)
            .await
            .map_err(|e| AppError::ConnectionRefused(e.to_string()))?;
        Ok(Box::new(SqliteHandle {
            conn: Mutex::new(conn),
        }))
    }
}

struct SqliteHandle {
    conn: Mutex<SqliteConnection>,
}

#[async_trait]
impl DbConnection for SqliteHandle {
    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.lock().await;
        conn.ping()
            .await
            .map_err(|e| AppError::ConnectionRefused(e.to_string()))
    }

    async fn query(&self, sql: &str, params: &[String]) -> AppResult<ResultSet> {
        let mut conn = self.conn.lock().await;
        // Prepare first so the column list comes from statement metadata
        // and survives a zero-row result.
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
            query = query.bind(param.as_str());
        }
        let rows = query
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| AppError::Sql(e.to_string()))?;

        let rows = rows.iter().map(decode_row).collect();
        Ok(ResultSet::new(columns, rows))
    }
}

fn decode_row(row: &SqliteRow) -> Vec<Value> {
    (0..row.columns().len())
        .map(|idx| decode_column(row, idx))
        .collect()
}

fn decode_column(row: &SqliteRow, idx: usize) -> Value {
    match row.column(idx).type_info().name() {
        "NULL" => Value::Null,
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "INTEGER" => row
            .try_get::<Option<i64>, _>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "REAL" => row
            .try_get::<Option<f64>, _>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "TEXT" | "DATETIME" | "DATE" | "TIME" => row
            .try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
        // Raw binary decodes to its textual form.
        "BLOB" => row
            .try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
            .unwrap_or(Value::Null),
        // SQLite is dynamically typed; expression columns can report
        // anything, so try the storage classes in turn.
        _ => {
            if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
                Value::from(v)
            } else if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
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
