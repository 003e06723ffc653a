//! Generic query result representation.

use serde::Serialize;
use utoipa::ToSchema;

/// Materialized result of one query execution.
///
/// Column order is whatever the driver reported; each row holds one scalar
/// per column in that same order. The whole structure is transient, built
/// for a single request and dropped after serialization.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ResultSet {
    /// Column names in driver-reported order.
    pub columns: Vec<String>,

    /// Row data; each inner vector is aligned with `columns`.
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl ResultSet {
    /// Creates a result set from a column list and row data.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the query returned no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
