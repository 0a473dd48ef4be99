//! Schema explorer commands: browse the live catalog.

use crate::database::CatalogReader;
use crate::db::models::{Column, SchemaInfo, TablePreview, TableRelations};
use crate::error::Result;

pub const DEFAULT_PREVIEW_LIMIT: i64 = 100;

pub async fn list_schemas(reader: &dyn CatalogReader) -> Result<Vec<SchemaInfo>> {
    Ok(reader.list_schemas().await?)
}

pub async fn list_tables(reader: &dyn CatalogReader, schema: &str) -> Result<Vec<TableRelations>> {
    Ok(reader.list_tables_with_relations(schema).await?)
}

pub async fn get_columns(
    reader: &dyn CatalogReader,
    schema: &str,
    table: &str,
) -> Result<Vec<Column>> {
    Ok(reader.list_columns(schema, table).await?)
}

/// First rows of a table; `limit` defaults to [`DEFAULT_PREVIEW_LIMIT`] and
/// negative values are treated as zero.
pub async fn get_table_data(
    reader: &dyn CatalogReader,
    schema: &str,
    table: &str,
    limit: Option<i64>,
) -> Result<TablePreview> {
    let limit = limit.unwrap_or(DEFAULT_PREVIEW_LIMIT).max(0);
    Ok(reader.preview_table(schema, table, limit).await?)
}
