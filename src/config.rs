//! TOML configuration for schemascope.
//!
//! Searched for in `./schemascope.toml`, then
//! `<config_dir>/schemascope/schemascope.toml`. String values may reference
//! environment variables as `${VAR}`.
//!
//! ```toml
//! [catalog]
//! host = "localhost"
//! port = 5432
//! database = "shop"
//! username = "postgres"
//! password = "${PG_PASSWORD}"
//! ssl = true
//!
//! [unified]
//! key = "unified_schema"
//! schemas = ["customers_schema", "orders_schema", "revenue_schema"]
//! timeout_secs = 30
//!
//! [store]
//! backend = "sqlite"
//! shape = "rows"
//!
//! [ai]
//! api_key = "${GEMINI_API_KEY}"
//! model = "gemini-2.0-flash"
//!
//! [logging]
//! level = "info"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::GeminiSettings;
use crate::database::PostgresConfig;
use crate::db::store::StoreShape;

pub const CONFIG_FILE_NAME: &str = "schemascope.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("unterminated ${{...}} reference in {0:?}")]
    UnterminatedReference(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: PostgresConfig,
    pub unified: UnifiedSettings,
    pub store: StoreSettings,
    pub ai: GeminiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnifiedSettings {
    /// Logical key the aggregated document is stored under.
    pub key: String,
    /// Source schemas, in the order they appear in the document.
    pub schemas: Vec<String>,
    /// Upper bound for one aggregation run; unbounded when absent.
    pub timeout_secs: Option<u64>,
}

impl Default for UnifiedSettings {
    fn default() -> Self {
        Self {
            key: "unified_schema".to_string(),
            schemas: vec![
                "customers_schema".to_string(),
                "orders_schema".to_string(),
                "revenue_schema".to_string(),
            ],
            timeout_secs: None,
        }
    }
}

impl UnifiedSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Local application database.
    #[default]
    Sqlite,
    /// The `unified_schema` schema of the catalog database.
    Postgres,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub shape: StoreShape,
    /// SQLite file; defaults to `<data_dir>/schemascope/schemascope.db`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// trace, debug, info, warn or error. `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads the first config file found on the search path, or defaults.
    pub fn load() -> Result<Self, ConfigError> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Config::default())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parses TOML and expands `${VAR}` references.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.resolve()
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("schemascope").join(CONFIG_FILE_NAME));
        }
        paths
    }

    fn resolve(mut self) -> Result<Self, ConfigError> {
        let catalog = &mut self.catalog;
        catalog.host = expand_env_vars(&catalog.host)?;
        catalog.database = expand_env_vars(&catalog.database)?;
        catalog.username = expand_env_vars(&catalog.username)?;
        catalog.password = expand_env_vars(&catalog.password)?;
        if let Some(api_key) = self.ai.api_key.take() {
            self.ai.api_key = Some(expand_env_vars(&api_key)?);
        }
        Ok(self)
    }
}

/// Expands `${VAR}` references from the process environment.
///
/// A lone `$` not followed by `{` is kept as is, so passwords containing `$`
/// survive unchanged.
pub fn expand_env_vars(s: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| ConfigError::UnterminatedReference(s.to_string()))?;
        let var_name = &after[..end];
        let value =
            env::var(var_name).map_err(|_| ConfigError::MissingEnvVar(var_name.to_string()))?;
        result.push_str(&value);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}
