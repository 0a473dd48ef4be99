use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Column {
    pub column_name: String,
    pub data_type: String,
    #[serde(default)]
    pub is_primary_key: bool,
}

/// Directed edge from `(schema, table, fk_column)` to the referenced column.
///
/// The referenced table may live outside the schemas that were aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ForeignKey {
    pub fk_column: String,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SchemaInfo {
    pub schema_name: String,
}

/// A table as the schema explorer lists it: name plus outgoing relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRelations {
    pub table_name: String,
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablePreview {
    pub schema: String,
    pub table: String,
    pub rows: Vec<serde_json::Value>,
    pub limit: i64,
}

/// Schema name to tables, in aggregation order.
///
/// Serializes as a JSON object (`{"orders_schema": [...], ...}`) whose key
/// order is the insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedSchema {
    schemas: Vec<(String, Vec<Table>)>,
}

impl UnifiedSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tables for `schema_name`, replacing any previous entry in place.
    pub fn insert(&mut self, schema_name: impl Into<String>, tables: Vec<Table>) {
        let schema_name = schema_name.into();
        match self.schemas.iter_mut().find(|(name, _)| *name == schema_name) {
            Some(entry) => entry.1 = tables,
            None => self.schemas.push((schema_name, tables)),
        }
    }

    /// Appends a table to `schema_name`, creating the entry on first sight.
    pub fn push_table(&mut self, schema_name: &str, table: Table) {
        match self.schemas.iter_mut().find(|(name, _)| name == schema_name) {
            Some(entry) => entry.1.push(table),
            None => self.schemas.push((schema_name.to_string(), vec![table])),
        }
    }

    pub fn get(&self, schema_name: &str) -> Option<&[Table]> {
        self.schemas
            .iter()
            .find(|(name, _)| name == schema_name)
            .map(|(_, tables)| tables.as_slice())
    }

    pub fn contains_schema(&self, schema_name: &str) -> bool {
        self.get(schema_name).is_some()
    }

    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Table])> {
        self.schemas
            .iter()
            .map(|(name, tables)| (name.as_str(), tables.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn table_count(&self) -> usize {
        self.schemas.iter().map(|(_, tables)| tables.len()).sum()
    }
}

impl FromIterator<(String, Vec<Table>)> for UnifiedSchema {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Table>)>>(iter: I) -> Self {
        let mut doc = UnifiedSchema::new();
        for (name, tables) in iter {
            doc.insert(name, tables);
        }
        doc
    }
}

impl Serialize for UnifiedSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.schemas.len()))?;
        for (name, tables) in &self.schemas {
            map.serialize_entry(name, tables)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for UnifiedSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct UnifiedSchemaVisitor;

        impl<'de> Visitor<'de> for UnifiedSchemaVisitor {
            type Value = UnifiedSchema;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of schema names to table lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut doc = UnifiedSchema::new();
                while let Some((name, tables)) = access.next_entry::<String, Vec<Table>>()? {
                    doc.insert(name, tables);
                }
                Ok(doc)
            }
        }

        deserializer.deserialize_map(UnifiedSchemaVisitor)
    }
}
