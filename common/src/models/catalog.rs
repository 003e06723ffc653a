//! Metric catalog models.
//!
//! The catalog maps database aliases to connection definitions and metric
//! names to pre-authored SQL templates. It is loaded once at startup and
//! read-only for the lifetime of the process.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::{AppError, AppResult};

/// One configured database, addressed by its caller-facing alias.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DatabaseDef {
    /// Driver name used to select a backend implementation
    /// (e.g. `mysql`, `postgres`, `sqlite`).
    #[validate(length(min = 1, message = "driver is required"))]
    pub driver: String,

    /// Driver-specific connection string.
    #[validate(length(min = 1, message = "dsn is required"))]
    pub dsn: String,

    /// Metric names this alias is allowed to execute. Names missing from
    /// the metric map are tolerated here and resolve to NOT_FOUND at
    /// request time.
    #[serde(default)]
    pub metrics: Vec<String>,
}

/// A named, pre-authored SQL query template.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MetricDef {
    /// Query text with optional `#name` (inline) and `$name` (bound)
    /// placeholder tokens.
    pub query: String,

    /// Human-readable description shown in metric listings.
    #[serde(default)]
    pub description: String,
}

/// Immutable alias and metric registry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    /// Alias to database definition.
    #[serde(default)]
    pub databases: HashMap<String, DatabaseDef>,

    /// Metric name to definition.
    #[serde(default)]
    pub metrics: HashMap<String, MetricDef>,
}

impl Catalog {
    /// Parses a catalog from JSON text and validates every definition.
    pub fn parse(json: &str) -> AppResult<Self> {
        let catalog: Catalog =
            serde_json::from_str(json).map_err(|e| AppError::Catalog(e.to_string()))?;
        for (alias, db) in &catalog.databases {
            db.validate()
                .map_err(|e| AppError::Catalog(format!("database '{}': {}", alias, e)))?;
        }
        Ok(catalog)
    }

    /// Reads and parses a catalog file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Catalog(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::parse(&text)
    }

    /// All known aliases, order-insensitive.
    pub fn aliases(&self) -> Vec<String> {
        self.databases.keys().cloned().collect()
    }

    /// Looks up a database definition by alias.
    pub fn database(&self, alias: &str) -> Option<&DatabaseDef> {
        self.databases.get(alias)
    }

    /// Looks up a metric definition by name.
    pub fn metric(&self, name: &str) -> Option<&MetricDef> {
        self.metrics.get(name)
    }

    /// Maps each metric allowed for `alias` to its description.
    /// Metric names missing from the metric map are silently skipped.
    pub fn metrics_for(&self, alias: &str) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        if let Some(db) = self.databases.get(alias) {
            for name in &db.metrics {
                if let Some(metric) = self.metrics.get(name) {
                    out.insert(name.clone(), metric.description.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::parse(
            r#"{
                "databases": {
                    "sales": {
                        "driver": "sqlite",
                        "dsn": "sqlite::memory:",
                        "metrics": ["count", "ghost"]
                    }
                },
                "metrics": {
                    "count": {
                        "query": "SELECT COUNT(*) AS n FROM #table WHERE id=$id",
                        "description": "row count"
                    }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn lookups_resolve_aliases_and_metrics() {
        let catalog = sample();
        assert_eq!(catalog.aliases(), vec!["sales".to_string()]);
        assert!(catalog.database("sales").is_some());
        assert!(catalog.database("nope").is_none());
        assert!(catalog.metric("count").is_some());
    }

    #[test]
    fn listing_skips_metrics_missing_from_the_map() {
        let catalog = sample();
        let listing = catalog.metrics_for("sales");
        assert_eq!(listing.len(), 1);
        assert_eq!(listing.get("count").map(String::as_str), Some("row count"));
        assert!(!listing.contains_key("ghost"));
    }

    #[test]
    fn empty_definitions_are_rejected() {
        let err = Catalog::parse(
            r#"{"databases": {"bad": {"driver": "", "dsn": "x"}}, "metrics": {}}"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), "CATALOG_ERROR");
    }

    #[test]
    fn malformed_json_is_a_catalog_error() {
        assert_eq!(Catalog::parse("{not json").unwrap_err().code(), "CATALOG_ERROR");
    }
}
