//! Persistence for unified schema documents.
//!
//! A store keeps at most one document per logical key. Two shapes are
//! supported:
//!
//! - [`StoreShape::Document`]: the whole document as one JSON value.
//! - [`StoreShape::Rows`]: one row per table carrying `schema_name`,
//!   `table_name`, `columns` and `foreign_keys`, plus a header row per key
//!   recording the schema names so that schemas without tables survive and a
//!   missing key can be told apart from an empty document.
//!
//! Both shapes load back to the same [`UnifiedSchema`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod postgres;
pub mod sqlite;

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

use crate::db::models::{Column, ForeignKey, Table, UnifiedSchema};
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreShape {
    #[default]
    Document,
    Rows,
}

#[async_trait]
pub trait UnifiedSchemaStore: Send + Sync {
    /// Create the backing tables if they do not exist yet
    async fn init(&self) -> Result<(), StoreError>;

    /// Insert or fully replace the document stored under `key`.
    ///
    /// Readers never observe a partially written document.
    async fn save(&self, key: &str, doc: &UnifiedSchema) -> Result<(), StoreError>;

    /// The document stored under `key`, or `None` if nothing was ever saved.
    async fn load(&self, key: &str) -> Result<Option<UnifiedSchema>, StoreError>;
}

/// One table of a document in the flattened shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub schema_name: String,
    pub table_name: String,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKey>,
}

/// Rows in document order: schemas in order, tables in order within each.
pub fn flatten(doc: &UnifiedSchema) -> Vec<TableRow> {
    doc.iter()
        .flat_map(|(schema_name, tables)| {
            tables.iter().map(move |table| TableRow {
                schema_name: schema_name.to_string(),
                table_name: table.table_name.clone(),
                columns: table.columns.clone(),
                foreign_keys: table.foreign_keys.clone(),
            })
        })
        .collect()
}

/// Rebuilds the nested shape from a header's schema names and its rows.
///
/// Every recorded schema gets an entry, even without rows. Rows are appended
/// to their schema in the order given; a schema first seen in the rows is
/// added after the recorded ones.
pub fn regroup<I>(schema_names: Vec<String>, rows: I) -> UnifiedSchema
where
    I: IntoIterator<Item = TableRow>,
{
    let mut doc: UnifiedSchema = schema_names
        .into_iter()
        .map(|name| (name, Vec::new()))
        .collect();

    for row in rows {
        doc.push_table(
            &row.schema_name,
            Table {
                table_name: row.table_name,
                columns: row.columns,
                foreign_keys: row.foreign_keys,
            },
        );
    }

    doc
}

pub(crate) fn schema_names(doc: &UnifiedSchema) -> Vec<String> {
    doc.schema_names().map(str::to_string).collect()
}
