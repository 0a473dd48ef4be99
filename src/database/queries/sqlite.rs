//! Store SQL for the local SQLite application database.
//!
//! JSON payloads are kept as TEXT.

pub const CREATE_DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS unified_metadata (
    schema_name TEXT PRIMARY KEY,
    metadata TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

pub const CREATE_HEADERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS unified_documents (
    doc_key TEXT PRIMARY KEY,
    schema_names TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

pub const CREATE_ROWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS unified_tables (
    doc_key TEXT NOT NULL,
    schema_name TEXT NOT NULL,
    table_name TEXT NOT NULL,
    position INTEGER NOT NULL,
    columns TEXT NOT NULL,
    foreign_keys TEXT NOT NULL,
    UNIQUE (doc_key, schema_name, table_name)
)
"#;

pub const UPSERT_DOCUMENT: &str = r#"
INSERT INTO unified_metadata (schema_name, metadata, updated_at)
VALUES (?, ?, ?)
ON CONFLICT (schema_name) DO UPDATE
SET metadata = excluded.metadata, updated_at = excluded.updated_at
"#;

pub const SELECT_DOCUMENT: &str = "SELECT metadata FROM unified_metadata WHERE schema_name = ?";

pub const UPSERT_HEADER: &str = r#"
INSERT INTO unified_documents (doc_key, schema_names, updated_at)
VALUES (?, ?, ?)
ON CONFLICT (doc_key) DO UPDATE
SET schema_names = excluded.schema_names, updated_at = excluded.updated_at
"#;

pub const SELECT_HEADER: &str = "SELECT schema_names FROM unified_documents WHERE doc_key = ?";

pub const DELETE_ROWS: &str = "DELETE FROM unified_tables WHERE doc_key = ?";

pub const INSERT_ROW: &str = r#"
INSERT INTO unified_tables (doc_key, schema_name, table_name, position, columns, foreign_keys)
VALUES (?, ?, ?, ?, ?, ?)
"#;

pub const SELECT_ROWS: &str = r#"
SELECT schema_name, table_name, columns, foreign_keys
FROM unified_tables
WHERE doc_key = ?
ORDER BY position
"#;
