//! Short natural-language descriptions of schema objects.

use async_trait::async_trait;
use thiserror::Error;

pub mod gemini;

pub use gemini::{GeminiClient, GeminiSettings};

use crate::db::models::Column;

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("no Gemini API key configured (set [ai] api_key or GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("request to the generative API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generative API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("generative API returned no text")]
    EmptyResponse,
}

#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    /// Free-text completion of `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, DescriptionError>;
}

pub fn column_description_prompt(schema: &str, table: &str, column: &Column) -> String {
    format!(
        "Generate a 3-4 word short description for the column \"{}\" in the table \"{}\" (schema: {}) with data type \"{}\".",
        column.column_name, table, schema, column.data_type
    )
}
