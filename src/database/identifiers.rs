//! Identifier handling for statements that cannot bind schema or table names
//! as parameters.

use crate::error::CatalogError;

/// Escape a SQL identifier by doubling any double quotes.
pub fn escape_sql_identifier(identifier: &str) -> String {
    identifier.replace('"', "\"\"")
}

/// `"schema"."table"` with both parts escaped.
pub fn qualified_table_name(schema: &str, table: &str) -> String {
    format!(
        "\"{}\".\"{}\"",
        escape_sql_identifier(schema),
        escape_sql_identifier(table)
    )
}

/// Accepts `table` only if the catalog listed it for `schema`.
///
/// Returns the quoted, schema-qualified name ready for interpolation.
pub fn allow_listed_table<S: AsRef<str>>(
    schema: &str,
    table: &str,
    known_tables: &[S],
) -> Result<String, CatalogError> {
    if schema.is_empty() || !known_tables.iter().any(|known| known.as_ref() == table) {
        return Err(CatalogError::UnknownTable {
            schema: schema.to_string(),
            table: table.to_string(),
        });
    }
    Ok(qualified_table_name(schema, table))
}
