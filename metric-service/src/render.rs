//! Result serialization and output format negotiation.

use axum::http::header::ACCEPT;
use axum::http::HeaderMap;
use common::errors::{AppError, AppResult};
use common::models::ResultSet;
use serde_json::{Map, Value};

/// Negotiated response encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON array of row objects.
    Json,
    /// Semicolon-delimited text, one line per row.
    Text,
}

impl OutputFormat {
    /// Picks the output format from the request.
    ///
    /// The `text` query flag wins over everything, then an explicit `json`
    /// flag, then an `Accept` header starting with `text`; the default is
    /// JSON.
    pub fn negotiate(params: &[(String, String)], headers: &HeaderMap) -> Self {
        let wants_text = params.iter().any(|(k, _)| k == "text");
        let wants_json = params.iter().any(|(k, _)| k == "json");
        let accept_text = headers
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("text"))
            .unwrap_or(false);

        if wants_text || (!wants_json && accept_text) {
            OutputFormat::Text
        } else {
            OutputFormat::Json
        }
    }
}

/// Renders rows as a JSON array of objects, one object per row, in row
/// order. An empty result renders as `[]`.
pub fn to_json(rs: &ResultSet) -> AppResult<Vec<u8>> {
    let objects: Vec<Map<String, Value>> = rs
        .rows
        .iter()
        .map(|row| {
            rs.columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect()
        })
        .collect();
    serde_json::to_vec(&objects).map_err(|e| AppError::Serialization(e.to_string()))
}

/// Renders rows as delimited text: columns joined by `;` in column order,
/// rows separated by newline, no trailing newline. Nulls render as the
/// literal `null`; an empty result renders as an empty body.
pub fn to_text(rs: &ResultSet) -> String {
    rs.rows
        .iter()
        .map(|row| {
            row.iter()
                .map(value_text)
                .collect::<Vec<_>>()
                .join(";")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
