//! MySQL / MariaDB backend.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use common::errors::{AppError, AppResult};
use common::models::ResultSet;
use serde_json::Value;
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Executor, Row, Statement, TypeInfo};
use tokio::sync::Mutex;

use super::{DbConnection, Driver};

/// MySQL driver, selected by the catalog names `mysql` / `mariadb`.
pub struct MySqlDriver;

#[async_trait]
impl Driver for MySqlDriver {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    async fn open(&self, dsn: &str) -> AppResult<Box<dyn DbConnection>> {
        let conn = MySqlConnection::connect(dsn)
            .await
            .map_err(|e| AppError::ConnectionRefused(e.to_string()))?;
        Ok(Box::new(MySqlHandle {
            conn: Mutex::new(conn),
        }))
    }
}

struct MySqlHandle {
    conn: Mutex<MySqlConnection>,
}

#[async_trait]
impl DbConnection for MySqlHandle {
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

fn decode_row(row: &MySqlRow) -> Vec<Value> {
    (0..row.columns().len())
        .map(|idx| decode_column(row, idx))
        .collect()
}

fn decode_column(row: &MySqlRow, idx: usize) -> Value {
    match row.column(idx).type_info().name() {
        "BOOLEAN" | "TINYINT(1)" => row
            .try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => row
            .try_get::<Option<i64>, _>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row
            .try_get::<Option<u64>, _>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "FLOAT" => row
            .try_get::<Option<f32>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::from(v as f64))
            .unwrap_or(Value::Null),
        "DOUBLE" => row
            .try_get::<Option<f64>, _>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" => row
            .try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
        "TIMESTAMP" | "DATETIME" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
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
        "JSON" => row
            .try_get::<Option<Value>, _>(idx)
            .ok()
            .flatten()
            .unwrap_or(Value::Null),
        // Raw binary decodes to its textual form.
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
            .try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
            .unwrap_or(Value::Null),
        // DECIMAL and anything else: fall back through the common decodes.
        _ => {
            if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
                Value::String(v)
            } else if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
                Value::from(v)
            } else if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
                Value::from(v)
            } else if let Ok(Some(v)) = row.try_get::<Option<Vec<u8>>, _>(idx) {
                Value::String(String::from_utf8_lossy(&v).into_owned())
            } else {
                Value::Null
            }
        }
    }
}
