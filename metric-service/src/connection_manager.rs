//! Per-alias connection cache.
//!
//! Holds at most one live handle per database alias. Handles are opened
//! lazily on first use, probed for liveness on every cache hit, and
//! discarded as soon as a probe fails so the next request opens a fresh
//! one. Concurrent requests for the same alias may race on replacing a
//! handle; the table itself stays consistent and a lost update only costs
//! an extra open.

use std::collections::HashMap;
use std::sync::Arc;

use common::errors::AppResult;
use tokio::sync::RwLock;

use crate::drivers::{DbConnection, Driver};

/// Caches one connection handle per alias.
#[derive(Default)]
pub struct ConnectionManager {
    handles: RwLock<HashMap<String, Arc<dyn DbConnection>>>,
}

impl ConnectionManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a live handle for `alias`, opening one if none is cached.
    ///
    /// A cached handle is probed first; on probe failure it is dropped
    /// from the table and the call fails with `ECONNREFUSED`, leaving the
    /// next request to open a fresh handle. Open failures likewise leave
    /// the slot empty so a later request retries.
    pub async fn acquire(
        &self,
        alias: &str,
        driver: &dyn Driver,
        dsn: &str,
    ) -> AppResult<Arc<dyn DbConnection>> {
        let cached = self.handles.read().await.get(alias).cloned();

        let handle = match cached {
            Some(handle) => {
                if let Err(e) = handle.ping().await {
                    let mut handles = self.handles.write().await;
                    // A concurrent request may have replaced the entry
                    // already; only evict the handle we probed.
                    if let Some(current) = handles.get(alias) {
                        if Arc::ptr_eq(current, &handle) {
                            handles.remove(alias);
                        }
                    }
                    return Err(e);
                }
                handle
            }
            None => {
                let opened: Arc<dyn DbConnection> = Arc::from(driver.open(dsn).await?);
                self.handles
                    .write()
                    .await
                    .insert(alias.to_string(), opened.clone());
                opened
            }
        };

        Ok(handle)
    }

    /// Number of cached handles (for diagnostics and tests).
    pub async fn cached(&self) -> usize {
        self.handles.read().await.len()
    }
}
