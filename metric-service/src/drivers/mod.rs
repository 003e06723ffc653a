//! Database driver capability interface.
//!
//! Each backend provides a [`Driver`] (how to open a connection and what
//! its positional placeholder looks like) and a [`DbConnection`] (liveness
//! probe plus query execution). Backends are selected by the driver name
//! string from the catalog; adding a backend means adding an implementation
//! here, not touching the core.

pub mod mysql;
pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;
use common::errors::{AppError, AppResult};
use common::models::ResultSet;

pub use mysql::MySqlDriver;
pub use postgres::PostgresDriver;
pub use sqlite::SqliteDriver;

/// A database backend.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Canonical driver name.
    fn name(&self) -> &'static str;

    /// Positional placeholder marker for the `index`-th bound parameter
    /// (1-based). MySQL and SQLite use `?`, PostgreSQL uses `$1`, `$2`, ...
    fn placeholder(&self, index: usize) -> String;

    /// Opens one live connection. Failures surface as `ECONNREFUSED`.
    async fn open(&self, dsn: &str) -> AppResult<Box<dyn DbConnection>>;
}

/// One live connection handle.
#[async_trait]
pub trait DbConnection: Send + Sync {
    /// Lightweight round-trip confirming the handle is still usable.
    async fn ping(&self) -> AppResult<()>;

    /// Runs a query with positional parameters and materializes all rows.
    async fn query(&self, sql: &str, params: &[String]) -> AppResult<ResultSet>;
}

impl std::fmt::Debug for dyn Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver").field("name", &self.name()).finish()
    }
}

impl std::fmt::Debug for dyn DbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConnection").finish_non_exhaustive()
    }
}

/// Resolves a catalog driver name to a backend implementation.
pub fn driver_for(name: &str) -> AppResult<&'static dyn Driver> {
    match name {
        "mysql" | "mariadb" => Ok(&MySqlDriver),
        "postgres" | "postgresql" => Ok(&PostgresDriver),
        "sqlite" | "sqlite3" => Ok(&SqliteDriver),
        other => Err(AppError::UnsupportedDriver(other.to_string())),
    }
}
