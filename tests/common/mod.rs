//! In-memory catalog used by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use schemascope_lib::database::identifiers::allow_listed_table;
use schemascope_lib::database::CatalogReader;
use schemascope_lib::db::models::{
    Column, ForeignKey, SchemaInfo, Table, TablePreview,
};
use schemascope_lib::error::CatalogError;
use serde_json::json;

#[derive(Default)]
pub struct MemoryCatalog {
    schemas: Vec<(String, Vec<Table>)>,
    failing_schemas: HashSet<String>,
    failing_tables: HashSet<(String, String)>,
    delays: HashMap<(String, String), Duration>,
    pub column_calls: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, name: &str, tables: Vec<Table>) -> Self {
        self.schemas.push((name.to_string(), tables));
        self
    }

    pub fn failing_schema(mut self, name: &str) -> Self {
        self.failing_schemas.insert(name.to_string());
        self
    }

    pub fn failing_table(mut self, schema: &str, table: &str) -> Self {
        self.failing_tables
            .insert((schema.to_string(), table.to_string()));
        self
    }

    /// Makes `list_columns` for the table take `delay`.
    pub fn slow_table(mut self, schema: &str, table: &str, delay: Duration) -> Self {
        self.delays
            .insert((schema.to_string(), table.to_string()), delay);
        self
    }

    fn table(&self, schema: &str, table: &str) -> Option<&Table> {
        self.schemas
            .iter()
            .find(|(name, _)| name == schema)
            .and_then(|(_, tables)| tables.iter().find(|t| t.table_name == table))
    }

    fn fail(operation: &'static str, schema: &str, table: Option<&str>) -> CatalogError {
        CatalogError::query(
            operation,
            schema,
            table,
            sqlx::Error::Protocol("simulated catalog failure".to_string()),
        )
    }
}

#[async_trait]
impl CatalogReader for MemoryCatalog {
    async fn list_schemas(&self) -> Result<Vec<SchemaInfo>, CatalogError> {
        Ok(self
            .schemas
            .iter()
            .map(|(name, _)| SchemaInfo {
                schema_name: name.clone(),
            })
            .collect())
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, CatalogError> {
        if self.failing_schemas.contains(schema) {
            return Err(Self::fail("list_tables", schema, None));
        }
        Ok(self
            .schemas
            .iter()
            .find(|(name, _)| name == schema)
            .map(|(_, tables)| tables.iter().map(|t| t.table_name.clone()).collect())
            .unwrap_or_default())
    }

    async fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<Column>, CatalogError> {
        self.column_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&(schema.to_string(), table.to_string())) {
            tokio::time::sleep(*delay).await;
        }
        if self
            .failing_tables
            .contains(&(schema.to_string(), table.to_string()))
        {
            return Err(Self::fail("list_columns", schema, Some(table)));
        }
        Ok(self
            .table(schema, table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn list_foreign_keys(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ForeignKey>, CatalogError> {
        Ok(self
            .table(schema, table)
            .map(|t| t.foreign_keys.clone())
            .unwrap_or_default())
    }

    async fn preview_table(
        &self,
        schema: &str,
        table: &str,
        limit: i64,
    ) -> Result<TablePreview, CatalogError> {
        let known = self.list_tables(schema).await?;
        allow_listed_table(schema, table, &known)?;
        Ok(TablePreview {
            schema: schema.to_string(),
            table: table.to_string(),
            rows: vec![json!({ "id": 1 })],
            limit,
        })
    }
}

pub fn column(name: &str, data_type: &str, is_primary_key: bool) -> Column {
    Column {
        column_name: name.to_string(),
        data_type: data_type.to_string(),
        is_primary_key,
    }
}

pub fn foreign_key(column: &str, schema: &str, table: &str, referenced: &str) -> ForeignKey {
    ForeignKey {
        fk_column: column.to_string(),
        referenced_schema: schema.to_string(),
        referenced_table: table.to_string(),
        referenced_column: referenced.to_string(),
    }
}

pub fn table(name: &str, columns: Vec<Column>, foreign_keys: Vec<ForeignKey>) -> Table {
    Table {
        table_name: name.to_string(),
        columns,
        foreign_keys,
    }
}

/// `customers.customers` and `orders.orders` with an FK between them.
pub fn shop_catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_schema(
            "customers",
            vec![table(
                "customers",
                vec![
                    column("customer_id", "integer", true),
                    column("email", "text", false),
                ],
                vec![],
            )],
        )
        .with_schema(
            "orders",
            vec![table(
                "orders",
                vec![
                    column("order_id", "integer", true),
                    column("customer_id", "integer", false),
                ],
                vec![foreign_key("customer_id", "customers", "customers", "customer_id")],
            )],
        )
}
