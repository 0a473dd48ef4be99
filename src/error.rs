//! Error types shared across the crate.
//!
//! Each component owns a narrow error enum; [`Error`] unifies them for the
//! command layer so callers can match on the failing component.

use std::time::Duration;

use thiserror::Error;

use crate::ai::DescriptionError;
use crate::config::ConfigError;

/// A failed catalog lookup, with the schema/table it was issued for.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to connect to catalog: {0}")]
    Connection(String),

    #[error("catalog query `{operation}` failed for {}: {source}", describe_target(.schema, .table.as_deref()))]
    Query {
        operation: &'static str,
        schema: String,
        table: Option<String>,
        #[source]
        source: sqlx::Error,
    },

    #[error("unknown table {schema}.{table}")]
    UnknownTable { schema: String, table: String },
}

impl CatalogError {
    pub fn query(
        operation: &'static str,
        schema: &str,
        table: Option<&str>,
        source: sqlx::Error,
    ) -> Self {
        CatalogError::Query {
            operation,
            schema: schema.to_string(),
            table: table.map(str::to_string),
            source,
        }
    }

    /// The schema this error was raised for, if any.
    pub fn schema(&self) -> Option<&str> {
        match self {
            CatalogError::Query { schema, .. } | CatalogError::UnknownTable { schema, .. } => {
                Some(schema)
            }
            CatalogError::Connection(_) => None,
        }
    }
}

fn describe_target(schema: &str, table: Option<&str>) -> String {
    match table {
        Some(table) => format!("table {}.{}", schema, table),
        None if schema.is_empty() => "catalog".to_string(),
        None => format!("schema {}", schema),
    }
}

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("aggregation aborted: {0}")]
    Catalog(#[from] CatalogError),

    #[error("aggregation timed out after {0:?}")]
    TimedOut(Duration),

    #[error("invalid schema name {0:?}")]
    InvalidSchemaName(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store query failed: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("stored document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to prepare store location: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to determine data directory for the local store")]
    NoDataDir,
}

/// Top-level error returned by the command layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No unified schema data found for key {key:?}.")]
    NotFound { key: String },

    #[error("unknown column {column} in {schema}.{table}")]
    UnknownColumn {
        schema: String,
        table: String,
        column: String,
    },

    #[error(transparent)]
    Description(#[from] DescriptionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_names_its_target() {
        let err = CatalogError::query(
            "list_columns",
            "orders_schema",
            Some("orders"),
            sqlx::Error::RowNotFound,
        );
        let message = err.to_string();
        assert!(message.contains("list_columns"));
        assert!(message.contains("table orders_schema.orders"));
        assert_eq!(err.schema(), Some("orders_schema"));
    }

    #[test]
    fn test_aggregation_error_wraps_catalog_error() {
        let err: AggregationError =
            CatalogError::query("list_tables", "revenue_schema", None, sqlx::Error::PoolTimedOut)
                .into();
        assert!(err.to_string().contains("schema revenue_schema"));
    }
}
