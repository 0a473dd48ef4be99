//! Integration tests for the command layer
//!
//! Uses the in-memory catalog and a temporary SQLite store, so no external
//! services are needed.
//!
//! Run with: cargo test --test commands_tests

mod common;

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::shop_catalog;
use schemascope_lib::ai::{DescriptionError, DescriptionGenerator};
use schemascope_lib::commands::{ai, schema, unified};
use schemascope_lib::config::UnifiedSettings;
use schemascope_lib::db::init_pool;
use schemascope_lib::db::store::{SqliteStore, StoreShape, UnifiedSchemaStore};
use schemascope_lib::error::{AggregationError, CatalogError, Error};
use tempfile::TempDir;

async fn create_test_store(shape: StoreShape) -> (SqliteStore, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pool = init_pool(&dir.path().join("store.db"))
        .await
        .expect("Failed to create pool");
    let store = SqliteStore::new(pool, shape);
    store.init().await.unwrap();
    (store, dir)
}

fn settings(schemas: &[&str]) -> UnifiedSettings {
    UnifiedSettings {
        key: "unified_schema".to_string(),
        schemas: schemas.iter().map(|s| s.to_string()).collect(),
        timeout_secs: Some(10),
    }
}

/// Echoes the prompt back and records it.
#[derive(Default)]
struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl DescriptionGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, DescriptionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!("  description #{}  ", self.prompts.lock().unwrap().len()))
    }
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

// ============================================================================
// Unified schema
// ============================================================================

#[tokio::test]
async fn test_create_then_get_unified_schema() {
    for shape in [StoreShape::Document, StoreShape::Rows] {
        let catalog = shop_catalog();
        let (store, _dir) = create_test_store(shape).await;
        let settings = settings(&["customers", "orders"]);

        let created = unified::create_unified_schema(&catalog, &store, &settings, None)
            .await
            .unwrap();
        let fetched = unified::get_unified_schema(&store, &settings.key)
            .await
            .unwrap();

        assert_eq!(created, fetched);
        assert_eq!(
            fetched.schema_names().collect::<Vec<_>>(),
            ["customers", "orders"]
        );
    }
}

#[tokio::test]
async fn test_get_before_create_is_not_found() {
    let (store, _dir) = create_test_store(StoreShape::Rows).await;

    let err = unified::get_unified_schema(&store, "unified_schema")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound { key } if key == "unified_schema"));
}

#[tokio::test]
async fn test_schema_override_replaces_configured_list() {
    let catalog = shop_catalog();
    let (store, _dir) = create_test_store(StoreShape::Document).await;
    let settings = settings(&["customers", "orders"]);
    let only_orders = vec!["orders".to_string()];

    let doc = unified::create_unified_schema(&catalog, &store, &settings, Some(only_orders.as_slice()))
        .await
        .unwrap();

    assert_eq!(doc.schema_names().collect::<Vec<_>>(), ["orders"]);
}

#[tokio::test]
async fn test_failed_aggregation_keeps_previous_document() {
    let (store, _dir) = create_test_store(StoreShape::Rows).await;
    let settings = settings(&["customers", "orders"]);

    let first = unified::create_unified_schema(&shop_catalog(), &store, &settings, None)
        .await
        .unwrap();

    let broken = shop_catalog().failing_table("orders", "orders");
    let err = unified::create_unified_schema(&broken, &store, &settings, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Aggregation(AggregationError::Catalog(_))
    ));

    let stored = unified::get_unified_schema(&store, &settings.key)
        .await
        .unwrap();
    assert_eq!(stored, first);
}

#[tokio::test]
async fn test_failed_table_fetch_is_logged_once() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::ERROR)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (store, _dir) = create_test_store(StoreShape::Document).await;
    let broken = shop_catalog().failing_table("orders", "orders");
    unified::create_unified_schema(&broken, &store, &settings(&["customers", "orders"]), None)
        .await
        .unwrap_err();

    let output = logs.contents();
    assert_eq!(output.matches("ERROR").count(), 1, "log output:\n{}", output);
}

// ============================================================================
// Explorer
// ============================================================================

#[tokio::test]
async fn test_list_tables_includes_relations() {
    let catalog = shop_catalog();

    let tables = schema::list_tables(&catalog, "orders").await.unwrap();

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].table_name, "orders");
    assert_eq!(tables[0].foreign_keys[0].referenced_table, "customers");
}

#[tokio::test]
async fn test_table_data_defaults_to_100_rows() {
    let catalog = shop_catalog();

    let preview = schema::get_table_data(&catalog, "customers", "customers", None)
        .await
        .unwrap();

    assert_eq!(preview.limit, 100);
}

#[tokio::test]
async fn test_table_data_clamps_negative_limit() {
    let catalog = shop_catalog();

    let preview = schema::get_table_data(&catalog, "customers", "customers", Some(-5))
        .await
        .unwrap();

    assert_eq!(preview.limit, 0);
}

#[tokio::test]
async fn test_table_data_rejects_unlisted_table() {
    let catalog = shop_catalog();

    let err = schema::get_table_data(&catalog, "customers", "customers; DROP TABLE x", Some(5))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Catalog(CatalogError::UnknownTable { .. })
    ));
}

// ============================================================================
// Descriptions
// ============================================================================

#[tokio::test]
async fn test_describe_all_columns() {
    let catalog = shop_catalog();
    let generator = RecordingGenerator::default();

    let descriptions = ai::describe_columns(&catalog, &generator, "orders", "orders", None)
        .await
        .unwrap();

    assert_eq!(descriptions.len(), 2);
    assert_eq!(descriptions[0].column_name, "order_id");
    assert_eq!(descriptions[0].description, "description #1");
    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[1].contains("\"customer_id\""));
}

#[tokio::test]
async fn test_describe_unknown_column() {
    let catalog = shop_catalog();
    let generator = RecordingGenerator::default();

    let err = ai::describe_columns(&catalog, &generator, "orders", "orders", Some("nope"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnknownColumn { column, .. } if column == "nope"));
    assert!(generator.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_ask_ai_passes_prompt_through() {
    let generator = RecordingGenerator::default();

    let answer = ai::ask_ai(&generator, "hello").await.unwrap();

    assert_eq!(answer.trim(), "description #1");
    assert_eq!(*generator.prompts.lock().unwrap(), vec!["hello".to_string()]);
}
