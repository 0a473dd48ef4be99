//! Unified schema commands: aggregate, persist and fetch the merged document.

use crate::config::UnifiedSettings;
use crate::database::aggregator::aggregate_with_deadline;
use crate::database::CatalogReader;
use crate::db::models::UnifiedSchema;
use crate::db::store::UnifiedSchemaStore;
use crate::error::{Error, Result};

/// Aggregates the configured schemas (or `schemas`, when given) and stores the
/// result under the configured key, replacing any previous document.
///
/// Nothing is written if aggregation fails.
pub async fn create_unified_schema(
    reader: &dyn CatalogReader,
    store: &dyn UnifiedSchemaStore,
    settings: &UnifiedSettings,
    schemas: Option<&[String]>,
) -> Result<UnifiedSchema> {
    let schema_names = schemas.unwrap_or(settings.schemas.as_slice());

    let doc = match aggregate_with_deadline(reader, schema_names, settings.timeout()).await {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(error = %e, "error creating unified schema");
            return Err(e.into());
        }
    };

    store.save(&settings.key, &doc).await?;
    Ok(doc)
}

/// The stored document, or [`Error::NotFound`] if none was ever created.
pub async fn get_unified_schema(store: &dyn UnifiedSchemaStore, key: &str) -> Result<UnifiedSchema> {
    store
        .load(key)
        .await?
        .ok_or_else(|| Error::NotFound {
            key: key.to_string(),
        })
}
