use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column as _, Row, TypeInfo, ValueRef};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::identifiers::allow_listed_table;
use super::{CatalogReader, PostgresConfig};
use crate::database::queries::postgres::{
    COLUMNS_QUERY, FOREIGN_KEYS_QUERY, SCHEMAS_QUERY, TABLES_QUERY,
};
use crate::db::models::{Column, ForeignKey, SchemaInfo, TablePreview};
use crate::error::CatalogError;

/// Catalog reader over `information_schema`.
///
/// Either wraps a pool handed in by the caller or lazily connects from a
/// [`PostgresConfig`]. A lazily created pool is dropped after a
/// connection-level failure so the next call reconnects.
pub struct PostgresCatalog {
    config: Option<PostgresConfig>,
    excluded_schemas: Vec<String>,
    pool: Arc<RwLock<Option<sqlx::PgPool>>>,
}

impl PostgresCatalog {
    pub fn new(config: PostgresConfig) -> Self {
        Self {
            excluded_schemas: config.excluded_schemas.clone(),
            config: Some(config),
            pool: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_pool(pool: sqlx::PgPool) -> Self {
        Self {
            config: None,
            excluded_schemas: PostgresConfig::default().excluded_schemas,
            pool: Arc::new(RwLock::new(Some(pool))),
        }
    }

    pub fn excluding_schemas(mut self, schemas: Vec<String>) -> Self {
        self.excluded_schemas = schemas;
        self
    }

    async fn create_pool(config: &PostgresConfig) -> Result<sqlx::PgPool, CatalogError> {
        let conn_str = config.connection_string();

        match tokio::time::timeout(
            Duration::from_secs(15),
            PgPoolOptions::new()
                .max_connections(config.max_connections.max(1))
                .acquire_timeout(Duration::from_secs(30))
                .idle_timeout(Duration::from_secs(600))
                .test_before_acquire(true)
                .connect(&conn_str),
        )
        .await
        {
            Ok(Ok(pool)) => {
                tracing::info!(host = %config.host, database = %config.database, "connected to catalog");
                Ok(pool)
            }
            Ok(Err(e)) => Err(CatalogError::Connection(format!(
                "Failed to connect to PostgreSQL: {}",
                e
            ))),
            Err(_) => Err(CatalogError::Connection(
                "Connection timed out after 15 seconds".to_string(),
            )),
        }
    }

    /// The pool, connecting on first use.
    pub async fn pool(&self) -> Result<sqlx::PgPool, CatalogError> {
        {
            let pool_guard = self.pool.read().await;
            if let Some(ref pool) = *pool_guard {
                return Ok(pool.clone());
            }
        }

        let mut pool_guard = self.pool.write().await;
        if let Some(ref pool) = *pool_guard {
            return Ok(pool.clone());
        }

        let config = self.config.as_ref().ok_or_else(|| {
            CatalogError::Connection("catalog pool was closed and cannot reconnect".to_string())
        })?;
        let new_pool = Self::create_pool(config).await?;
        *pool_guard = Some(new_pool.clone());
        Ok(new_pool)
    }

    async fn reset_pool(&self) {
        if self.config.is_none() {
            return;
        }
        let mut pool_guard = self.pool.write().await;
        if let Some(pool) = pool_guard.take() {
            pool.close().await;
        }
    }

    /// Wraps a query failure with its context, resetting the pool if the
    /// connection itself went away.
    async fn query_error(
        &self,
        operation: &'static str,
        schema: &str,
        table: Option<&str>,
        error: sqlx::Error,
    ) -> CatalogError {
        if is_connection_error(&error) {
            tracing::warn!(operation, schema, error = %error, "catalog connection lost, resetting pool");
            self.reset_pool().await;
        }
        CatalogError::query(operation, schema, table, error)
    }
}

fn is_connection_error(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Io(_) | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => true,
        other => {
            let error_str = other.to_string();
            error_str.contains("Connection reset by peer")
                || error_str.contains("broken pipe")
                || error_str.contains("connection closed")
                || error_str.contains("server closed the connection")
        }
    }
}

/// Renders one result row as a JSON object, keeping column order.
fn row_to_json(row: &PgRow) -> Value {
    let mut obj = serde_json::Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        let type_name = col.type_info().name();
        let is_null = row.try_get_raw(i).map(|raw| raw.is_null()).unwrap_or(true);
        if is_null {
            obj.insert(col.name().to_string(), Value::Null);
            continue;
        }
        let value: Value = match type_name {
            "INT2" => row.try_get::<i16, _>(i).map(|v| json!(v)).unwrap_or(Value::Null),
            "INT4" => row.try_get::<i32, _>(i).map(|v| json!(v)).unwrap_or(Value::Null),
            "INT8" => row.try_get::<i64, _>(i).map(|v| json!(v)).unwrap_or(Value::Null),
            "FLOAT4" => row.try_get::<f32, _>(i).map(|v| json!(v)).unwrap_or(Value::Null),
            "FLOAT8" => row.try_get::<f64, _>(i).map(|v| json!(v)).unwrap_or(Value::Null),
            // Rendered as a string so no precision is lost.
            "NUMERIC" => row
                .try_get::<rust_decimal::Decimal, _>(i)
                .map(|v| json!(v.to_string()))
                .unwrap_or_else(|_| json!(format!("<{}>", type_name))),
            "BOOL" => row.try_get::<bool, _>(i).map(|v| json!(v)).unwrap_or(Value::Null),
            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
                .try_get::<String, _>(i)
                .map(|v| json!(v))
                .unwrap_or(Value::Null),
            "UUID" => row
                .try_get::<uuid::Uuid, _>(i)
                .map(|v| json!(v.to_string()))
                .unwrap_or(Value::Null),
            "TIMESTAMP" => row
                .try_get::<chrono::NaiveDateTime, _>(i)
                .map(|v| json!(v.to_string()))
                .unwrap_or(Value::Null),
            "TIMESTAMPTZ" => row
                .try_get::<chrono::DateTime<chrono::Utc>, _>(i)
                .map(|v| json!(v.to_rfc3339()))
                .unwrap_or(Value::Null),
            "DATE" => row
                .try_get::<chrono::NaiveDate, _>(i)
                .map(|v| json!(v.to_string()))
                .unwrap_or(Value::Null),
            "TIME" => row
                .try_get::<chrono::NaiveTime, _>(i)
                .map(|v| json!(v.to_string()))
                .unwrap_or(Value::Null),
            "JSON" | "JSONB" => row.try_get::<Value, _>(i).unwrap_or(Value::Null),
            "BYTEA" => row
                .try_get::<Vec<u8>, _>(i)
                .map(|v| json!(format!("\\x{}", hex::encode(&v))))
                .unwrap_or(Value::Null),
            _ => row
                .try_get::<String, _>(i)
                .map(|v| json!(v))
                .unwrap_or_else(|_| json!(format!("<{}>", type_name))),
        };
        obj.insert(col.name().to_string(), value);
    }
    Value::Object(obj)
}

#[async_trait]
impl CatalogReader for PostgresCatalog {
    async fn list_schemas(&self) -> Result<Vec<SchemaInfo>, CatalogError> {
        let pool = self.pool().await?;

        match sqlx::query_as::<_, SchemaInfo>(SCHEMAS_QUERY)
            .bind(self.excluded_schemas.as_slice())
            .fetch_all(&pool)
            .await
        {
            Ok(schemas) => Ok(schemas),
            Err(e) => Err(self.query_error("list_schemas", "", None, e).await),
        }
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, CatalogError> {
        let pool = self.pool().await?;

        match sqlx::query_scalar::<_, String>(TABLES_QUERY)
            .bind(schema)
            .fetch_all(&pool)
            .await
        {
            Ok(tables) => {
                tracing::debug!(schema, count = tables.len(), "listed tables");
                Ok(tables)
            }
            Err(e) => Err(self.query_error("list_tables", schema, None, e).await),
        }
    }

    async fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<Column>, CatalogError> {
        let pool = self.pool().await?;

        match sqlx::query_as::<_, Column>(COLUMNS_QUERY)
            .bind(schema)
            .bind(table)
            .fetch_all(&pool)
            .await
        {
            Ok(columns) => Ok(columns),
            Err(e) => Err(self.query_error("list_columns", schema, Some(table), e).await),
        }
    }

    async fn list_foreign_keys(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ForeignKey>, CatalogError> {
        let pool = self.pool().await?;

        match sqlx::query_as::<_, ForeignKey>(FOREIGN_KEYS_QUERY)
            .bind(schema)
            .bind(table)
            .fetch_all(&pool)
            .await
        {
            Ok(foreign_keys) => Ok(foreign_keys),
            Err(e) => Err(self
                .query_error("list_foreign_keys", schema, Some(table), e)
                .await),
        }
    }

    async fn preview_table(
        &self,
        schema: &str,
        table: &str,
        limit: i64,
    ) -> Result<TablePreview, CatalogError> {
        let limit = limit.max(0);
        let known_tables = self.list_tables(schema).await?;
        let full_table_name = allow_listed_table(schema, table, &known_tables)?;
        let pool = self.pool().await?;

        let data_query = format!("SELECT * FROM {} LIMIT $1", full_table_name);
        let rows = match sqlx::query(&data_query)
            .bind(limit)
            .fetch_all(&pool)
            .await
        {
            Ok(rows) => rows,
            Err(e) => return Err(self.query_error("preview_table", schema, Some(table), e).await),
        };

        Ok(TablePreview {
            schema: schema.to_string(),
            table: table.to_string(),
            rows: rows.iter().map(row_to_json).collect(),
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_detected() {
        assert!(is_connection_error(&sqlx::Error::PoolClosed));
        assert!(is_connection_error(&sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset"
        ))));
        assert!(!is_connection_error(&sqlx::Error::RowNotFound));
    }
}
