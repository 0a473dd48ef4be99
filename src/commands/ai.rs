use serde::{Deserialize, Serialize};

use crate::ai::{column_description_prompt, DescriptionGenerator};
use crate::database::CatalogReader;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub column_name: String,
    pub description: String,
}

pub async fn ask_ai(generator: &dyn DescriptionGenerator, prompt: &str) -> Result<String> {
    Ok(generator.generate(prompt).await?)
}

/// Describes every column of a table, or only `column` when given.
///
/// Columns are described one at a time to stay clear of API rate limits.
pub async fn describe_columns(
    reader: &dyn CatalogReader,
    generator: &dyn DescriptionGenerator,
    schema: &str,
    table: &str,
    column: Option<&str>,
) -> Result<Vec<ColumnDescription>> {
    let mut columns = reader.list_columns(schema, table).await?;
    if let Some(wanted) = column {
        columns.retain(|c| c.column_name == wanted);
        if columns.is_empty() {
            return Err(Error::UnknownColumn {
                schema: schema.to_string(),
                table: table.to_string(),
                column: wanted.to_string(),
            });
        }
    }

    let mut descriptions = Vec::with_capacity(columns.len());
    for column in &columns {
        let prompt = column_description_prompt(schema, table, column);
        let description = generator.generate(&prompt).await?;
        descriptions.push(ColumnDescription {
            column_name: column.column_name.clone(),
            description: description.trim().to_string(),
        });
    }
    Ok(descriptions)
}
