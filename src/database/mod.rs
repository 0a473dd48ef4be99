use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod aggregator;
pub mod identifiers;
pub mod postgres;
pub mod queries;

use crate::db::models::{Column, ForeignKey, SchemaInfo, TablePreview, TableRelations};
use crate::error::CatalogError;

/// Read-only access to a database catalog.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// List user schemas
    async fn list_schemas(&self) -> Result<Vec<SchemaInfo>, CatalogError>;

    /// List the tables of a schema. Unknown schemas yield an empty list.
    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, CatalogError>;

    /// List the columns of a table in ordinal order
    async fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<Column>, CatalogError>;

    /// List the foreign keys declared on a table
    async fn list_foreign_keys(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ForeignKey>, CatalogError>;

    /// Fetch up to `limit` rows of a table.
    ///
    /// Implementations must only interpolate identifiers returned by
    /// [`CatalogReader::list_tables`].
    async fn preview_table(
        &self,
        schema: &str,
        table: &str,
        limit: i64,
    ) -> Result<TablePreview, CatalogError>;

    /// Tables of a schema together with their outgoing foreign keys.
    async fn list_tables_with_relations(
        &self,
        schema: &str,
    ) -> Result<Vec<TableRelations>, CatalogError> {
        let mut tables = Vec::new();
        for table_name in self.list_tables(schema).await? {
            let foreign_keys = self.list_foreign_keys(schema, &table_name).await?;
            tables.push(TableRelations {
                table_name,
                foreign_keys,
            });
        }
        Ok(tables)
    }
}

/// Configuration for Postgres connections
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: i64,
    pub database: String,
    pub username: String,
    pub password: String,
    pub ssl: bool,
    pub max_connections: u32,
    /// Schemas hidden from `list_schemas` in addition to the system ones.
    pub excluded_schemas: Vec<String>,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            username: "postgres".to_string(),
            password: String::new(),
            ssl: false,
            max_connections: 5,
            excluded_schemas: vec!["public".to_string()],
        }
    }
}

impl PostgresConfig {
    pub fn connection_string(&self) -> String {
        let ssl_mode = if self.ssl { "require" } else { "disable" };
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.username, self.password, self.host, self.port, self.database, ssl_mode
        )
    }
}
