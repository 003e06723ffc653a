//! Shared data models.

pub mod catalog;
pub mod result;

// Re-export commonly used types
pub use catalog::{Catalog, DatabaseDef, MetricDef};
pub use result::ResultSet;
