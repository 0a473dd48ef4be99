use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use super::{flatten, regroup, schema_names, StoreShape, TableRow, UnifiedSchemaStore};
use crate::database::queries::postgres::{
    CREATE_DOCUMENTS_TABLE, CREATE_HEADERS_TABLE, CREATE_ROWS_TABLE, CREATE_STORE_SCHEMA,
    DELETE_ROWS, INSERT_ROW, READ_SNAPSHOT, SELECT_DOCUMENT, SELECT_HEADER, SELECT_ROWS,
    UPSERT_DOCUMENT, UPSERT_HEADER,
};
use crate::db::models::{Column, ForeignKey, UnifiedSchema};
use crate::error::StoreError;

/// Store kept in the `unified_schema` schema of a PostgreSQL database.
pub struct PostgresStore {
    pool: PgPool,
    shape: StoreShape,
}

impl PostgresStore {
    pub fn new(pool: PgPool, shape: StoreShape) -> Self {
        Self { pool, shape }
    }

    async fn save_document(&self, key: &str, doc: &UnifiedSchema) -> Result<(), StoreError> {
        let metadata = serde_json::to_string(doc)?;
        sqlx::query(UPSERT_DOCUMENT)
            .bind(key)
            .bind(&metadata)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_rows(&self, key: &str, doc: &UnifiedSchema) -> Result<(), StoreError> {
        let rows = flatten(doc);

        let mut tx = self.pool.begin().await?;
        sqlx::query(UPSERT_HEADER)
            .bind(key)
            .bind(Json(schema_names(doc)))
            .bind(chrono::Utc::now())
            .execute(&mut *tx)
            .await?;
        sqlx::query(DELETE_ROWS).bind(key).execute(&mut *tx).await?;
        for (position, row) in rows.iter().enumerate() {
            sqlx::query(INSERT_ROW)
                .bind(key)
                .bind(&row.schema_name)
                .bind(&row.table_name)
                .bind(position as i32)
                .bind(Json(&row.columns))
                .bind(Json(&row.foreign_keys))
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
        let mut tx = self.pool.begin().await?;
        sqlx::query(READ_SNAPSHOT).execute(&mut *tx).await?;

        let header: Option<Json<Vec<String>>> = sqlx::query_scalar(SELECT_HEADER)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(Json(names)) = header else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, (String, String, Json<Vec<Column>>, Json<Vec<ForeignKey>>)>(
            SELECT_ROWS,
        )
        .bind(key)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Some(regroup(
            names,
            rows.into_iter()
                .map(|(schema_name, table_name, Json(columns), Json(foreign_keys))| TableRow {
                    schema_name,
                    table_name,
                    columns,
                    foreign_keys,
                }),
        )))
    }
}

#[async_trait]
impl UnifiedSchemaStore for PostgresStore {
    async fn init(&self) -> Result<(), StoreError> {
        for statement in [
            CREATE_STORE_SCHEMA,
            CREATE_DOCUMENTS_TABLE,
            CREATE_HEADERS_TABLE,
            CREATE_ROWS_TABLE,
        ] {
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
