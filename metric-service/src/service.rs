//! Metric execution orchestration.

use std::sync::Arc;

use common::errors::{AppError, AppResult};
use common::models::{Catalog, ResultSet};

use crate::connection_manager::ConnectionManager;
use crate::drivers::driver_for;
use crate::query_builder;

/// Runs catalog-defined metrics against their configured databases.
pub struct MetricService {
    catalog: Arc<Catalog>,
    connections: Arc<ConnectionManager>,
}

impl MetricService {
    /// Creates a new metric service over an immutable catalog and a shared
    /// connection cache.
    pub fn new(catalog: Arc<Catalog>, connections: Arc<ConnectionManager>) -> Self {
        Self {
            catalog,
            connections,
        }
    }

    /// Executes `metric` against `alias` with the request's substitution
    /// parameters and materializes the result.
    ///
    /// The metric must be both allowed for the alias and present in the
    /// metric map; otherwise the request fails with `NOT_FOUND` before any
    /// connection work happens.
    pub async fn execute(
        &self,
        alias: &str,
        metric: &str,
        params: &[(String, String)],
    ) -> AppResult<ResultSet> {
        let db = self.catalog.database(alias).ok_or(AppError::NotFound)?;
        if !db.metrics.iter().any(|name| name == metric) {
            return Err(AppError::NotFound);
        }
        let def = self.catalog.metric(metric).ok_or(AppError::NotFound)?;

        let driver = driver_for(&db.driver)?;
        let (sql, bound) = query_builder::build(&def.query, params, driver);

        let handle = match self.connections.acquire(alias, driver, &db.dsn).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(
                    alias,
                    metric,
                    query = %sql,
                    params = ?bound,
                    error = %e,
                    "connection unavailable"
                );
                return Err(e);
            }
        };

        match handle.query(&sql, &bound).await {
            Ok(rs) => Ok(rs),
            Err(e) => {
                tracing::error!(
                    alias,
                    metric,
                    query = %sql,
                    params = ?bound,
                    error = %e,
                    "query failed"
                );
                Err(e)
            }
        }
    }
}
