use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{flatten, regroup, schema_names, StoreShape, TableRow, UnifiedSchemaStore};
use crate::database::queries::sqlite::{
    CREATE_DOCUMENTS_TABLE, CREATE_HEADERS_TABLE, CREATE_ROWS_TABLE, DELETE_ROWS, INSERT_ROW,
    SELECT_DOCUMENT, SELECT_HEADER, SELECT_ROWS, UPSERT_DOCUMENT, UPSERT_HEADER,
};
use crate::db::models::UnifiedSchema;
use crate::error::StoreError;

/// Store backed by the local SQLite application database.
pub struct SqliteStore {
    pool: SqlitePool,
    shape: StoreShape,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, shape: StoreShape) -> Self {
        Self { pool, shape }
    }

    pub fn shape(&self) -> StoreShape {
        self.shape
    }

    async fn save_document(&self, key: &str, doc: &UnifiedSchema) -> Result<(), StoreError> {
        let metadata = serde_json::to_string(doc)?;
        sqlx::query(UPSERT_DOCUMENT)
            .bind(key)
            .bind(&metadata)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_rows(&self, key: &str, doc: &UnifiedSchema) -> Result<(), StoreError> {
        let header = serde_json::to_string(&schema_names(doc))?;
        let rows = flatten(doc);

        let mut tx = self.pool.begin().await?;
        sqlx::query(UPSERT_HEADER)
            .bind(key)
            .bind(&header)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;
        sqlx::query(DELETE_ROWS).bind(key).execute(&mut *tx).await?;
        for (position, row) in rows.iter().enumerate() {
            sqlx::query(INSERT_ROW)
                .bind(key)
                .bind(&row.schema_name)
                .bind(&row.table_name)
                .bind(position as i64)
                .bind(serde_json::to_string(&row.columns)?)
                .bind(serde_json::to_string(&row.foreign_keys)?)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn load_document(&self, key: &str) -> Result<Option<UnifiedSchema>, StoreError> {
        let metadata: Option<String> = sqlx::query_scalar(SELECT_DOCUMENT)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match metadata {
            Some(metadata) => Ok(Some(serde_json::from_str(&metadata)?)),
            None => Ok(None),
        }
    }

    async fn load_rows(&self, key: &str) -> Result<Option<UnifiedSchema>, StoreError> {
        // One read transaction so the header and rows come from the same save.
        let mut tx = self.pool.begin().await?;

        let header: Option<String> = sqlx::query_scalar(SELECT_HEADER)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(header) = header else {
            return Ok(None);
        };
        let names: Vec<String> = serde_json::from_str(&header)?;

        let raw_rows = sqlx::query_as::<_, (String, String, String, String)>(SELECT_ROWS)
            .bind(key)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        let mut rows = Vec::with_capacity(raw_rows.len());
        for (schema_name, table_name, columns, foreign_keys) in raw_rows {
            rows.push(TableRow {
                schema_name,
                table_name,
                columns: serde_json::from_str(&columns)?,
                foreign_keys: serde_json::from_str(&foreign_keys)?,
            });
        }

        Ok(Some(regroup(names, rows)))
    }
}

#[async_trait]
impl UnifiedSchemaStore for SqliteStore {
    async fn init(&self) -> Result<(), StoreError> {
        for statement in [CREATE_DOCUMENTS_TABLE, CREATE_HEADERS_TABLE, CREATE_ROWS_TABLE] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn save(&self, key: &str, doc: &UnifiedSchema) -> Result<(), StoreError> {
        match self.shape {
            StoreShape::Document => self.save_document(key, doc).await?,
            StoreShape::Rows => self.save_rows(key, doc).await?,
        }
        tracing::info!(key, shape = ?self.shape, tables = doc.table_count(), "saved unified schema");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<UnifiedSchema>, StoreError> {
        match self.shape {
            StoreShape::Document => self.load_document(key).await,
            StoreShape::Rows => self.load_rows(key).await,
        }
    }
}
