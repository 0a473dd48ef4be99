//! Builds a [`UnifiedSchema`] from several catalog schemas.
//!
//! Schemas and their tables are fetched concurrently. Results land in the
//! slot of the schema/table they were requested for, so the document follows
//! the input order and the order `list_tables` returned, whatever order the
//! fetches complete in. The first failure aborts the whole run.

use std::time::Duration;

use futures_util::future::try_join_all;
use futures_util::try_join;

use super::CatalogReader;
use crate::db::models::{Table, UnifiedSchema};
use crate::error::{AggregationError, CatalogError};

/// Aggregates `schema_names` without a deadline.
pub async fn aggregate<R, S>(reader: &R, schema_names: &[S]) -> Result<UnifiedSchema, AggregationError>
where
    R: CatalogReader + ?Sized,
    S: AsRef<str>,
{
    aggregate_with_deadline(reader, schema_names, None).await
}

/// Aggregates `schema_names`, giving up on the whole run once `deadline`
/// elapses.
pub async fn aggregate_with_deadline<R, S>(
    reader: &R,
    schema_names: &[S],
    deadline: Option<Duration>,
) -> Result<UnifiedSchema, AggregationError>
where
    R: CatalogReader + ?Sized,
    S: AsRef<str>,
{
    let names = distinct_names(schema_names)?;
    tracing::info!(schemas = ?names, "aggregating unified schema");

    let fan_out = try_join_all(names.iter().map(|name| fetch_schema(reader, name)));
    let schemas = match deadline {
        Some(limit) => tokio::time::timeout(limit, fan_out)
            .await
            .map_err(|_| AggregationError::TimedOut(limit))??,
        None => fan_out.await?,
    };

    let doc: UnifiedSchema = names.into_iter().zip(schemas).collect();
    tracing::info!(
        schemas = doc.len(),
        tables = doc.table_count(),
        "unified schema aggregated"
    );
    Ok(doc)
}

/// Input names with duplicates collapsed to their first occurrence.
fn distinct_names<S: AsRef<str>>(schema_names: &[S]) -> Result<Vec<String>, AggregationError> {
    let mut names: Vec<String> = Vec::with_capacity(schema_names.len());
    for name in schema_names {
        let name = name.as_ref();
        if name.trim().is_empty() {
            return Err(AggregationError::InvalidSchemaName(name.to_string()));
        }
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

async fn fetch_schema<R>(reader: &R, schema: &str) -> Result<Vec<Table>, CatalogError>
where
    R: CatalogReader + ?Sized,
{
    let table_names = reader.list_tables(schema).await?;
    try_join_all(
        table_names
            .iter()
            .map(|table_name| fetch_table(reader, schema, table_name)),
    )
    .await
}

async fn fetch_table<R>(reader: &R, schema: &str, table_name: &str) -> Result<Table, CatalogError>
where
    R: CatalogReader + ?Sized,
{
    let (columns, foreign_keys) = try_join!(
        reader.list_columns(schema, table_name),
        reader.list_foreign_keys(schema, table_name)
    )?;

    Ok(Table {
        table_name: table_name.to_string(),
        columns,
        foreign_keys,
    })
}
