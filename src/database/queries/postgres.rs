//! Catalog and store SQL for PostgreSQL.
//!
//! `information_schema` columns are domain types (`sql_identifier`,
//! `character_data`) and `pg_catalog` names are `name`; every projected
//! column is cast to `text`.

pub const SCHEMAS_QUERY: &str = r#"
SELECT schema_name::text AS schema_name
FROM information_schema.schemata
WHERE schema_name NOT IN ('pg_catalog', 'information_schema')
    AND schema_name NOT LIKE 'pg\_toast%'
    AND schema_name NOT LIKE 'pg\_temp%'
    AND NOT (schema_name::text = ANY($1))
ORDER BY schema_name;
"#;

pub const TABLES_QUERY: &str = r#"
SELECT table_name::text AS table_name
FROM information_schema.tables
WHERE table_schema = $1
ORDER BY table_name;
"#;

pub const COLUMNS_QUERY: &str = r#"
SELECT
    c.column_name::text AS column_name,
    c.data_type::text AS data_type,
    EXISTS(
        SELECT 1
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON kcu.constraint_schema = tc.constraint_schema
            AND kcu.constraint_name = tc.constraint_name
            AND kcu.table_schema = tc.table_schema
            AND kcu.table_name = tc.table_name
        WHERE tc.constraint_type = 'PRIMARY KEY'
            AND tc.table_schema = c.table_schema
            AND tc.table_name = c.table_name
            AND kcu.column_name = c.column_name
    ) AS is_primary_key
FROM information_schema.columns c
WHERE c.table_schema = $1
    AND c.table_name = $2
ORDER BY c.ordinal_position;
"#;

// Read from `pg_constraint` rather than `information_schema`:
// `referential_constraints` is keyed by constraint name only, and foreign key
// names are unique per table, not per schema. Composite keys pair up through
// the positions of `conkey` and `confkey`.
pub const FOREIGN_KEYS_QUERY: &str = r#"
SELECT
    a.attname::text AS fk_column,
    rn.nspname::text AS referenced_schema,
    rt.relname::text AS referenced_table,
    ra.attname::text AS referenced_column
FROM pg_constraint con
JOIN pg_class t ON t.oid = con.conrelid
JOIN pg_namespace n ON n.oid = t.relnamespace
JOIN pg_class rt ON rt.oid = con.confrelid
JOIN pg_namespace rn ON rn.oid = rt.relnamespace
CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(attnum, ref_attnum, ord)
JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
JOIN pg_attribute ra ON ra.attrelid = con.confrelid AND ra.attnum = k.ref_attnum
WHERE con.contype = 'f'
    AND n.nspname = $1
    AND t.relname = $2
ORDER BY con.conname, k.ord;
"#;

pub const CREATE_STORE_SCHEMA: &str = "CREATE SCHEMA IF NOT EXISTS unified_schema";

pub const CREATE_DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS unified_schema.metadata (
    schema_name TEXT PRIMARY KEY,
    metadata JSON NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

pub const CREATE_HEADERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS unified_schema.documents (
    doc_key TEXT PRIMARY KEY,
    schema_names JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

pub const CREATE_ROWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS unified_schema.tables (
    doc_key TEXT NOT NULL REFERENCES unified_schema.documents(doc_key) ON DELETE CASCADE,
    schema_name TEXT NOT NULL,
    table_name TEXT NOT NULL,
    position INTEGER NOT NULL,
    columns JSONB NOT NULL,
    foreign_keys JSONB NOT NULL,
    UNIQUE (doc_key, schema_name, table_name)
)
"#;

pub const UPSERT_DOCUMENT: &str = r#"
INSERT INTO unified_schema.metadata (schema_name, metadata, updated_at)
VALUES ($1, $2::json, $3)
ON CONFLICT (schema_name) DO UPDATE
SET metadata = EXCLUDED.metadata, updated_at = EXCLUDED.updated_at
"#;

// `json` rather than `jsonb`: the document's schema order lives in its key
// order, which `jsonb` does not keep.
pub const SELECT_DOCUMENT: &str =
    "SELECT metadata::text FROM unified_schema.metadata WHERE schema_name = $1";

pub const UPSERT_HEADER: &str = r#"
INSERT INTO unified_schema.documents (doc_key, schema_names, updated_at)
VALUES ($1, $2, $3)
ON CONFLICT (doc_key) DO UPDATE
SET schema_names = EXCLUDED.schema_names, updated_at = EXCLUDED.updated_at
"#;

// Statements of a READ COMMITTED transaction each take their own snapshot;
// the header and rows must come from the same one.
pub const READ_SNAPSHOT: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

pub const SELECT_HEADER: &str =
    "SELECT schema_names FROM unified_schema.documents WHERE doc_key = $1";

pub const DELETE_ROWS: &str = "DELETE FROM unified_schema.tables WHERE doc_key = $1";

pub const INSERT_ROW: &str = r#"
INSERT INTO unified_schema.tables (doc_key, schema_name, table_name, position, columns, foreign_keys)
VALUES ($1, $2, $3, $4, $5, $6)
"#;

pub const SELECT_ROWS: &str = r#"
SELECT schema_name, table_name, columns, foreign_keys
FROM unified_schema.tables
WHERE doc_key = $1
ORDER BY position
"#;
