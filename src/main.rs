//! schemascope CLI - browse PostgreSQL schemas and build a unified schema
//!
//! Usage:
//!   schemascope schemas
//!   schemascope tables <schema>
//!   schemascope columns <schema> <table>
//!   schemascope data <schema> <table> [--limit N]
//!   schemascope unify [--schema NAME]...
//!   schemascope show
//!   schemascope describe <schema> <table> [--column NAME]
//!   schemascope init

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use schemascope_lib::ai::GeminiClient;
use schemascope_lib::commands::{ai, schema, unified};
use schemascope_lib::config::{Config, StoreBackend};
use schemascope_lib::database::postgres::PostgresCatalog;
use schemascope_lib::db::store::{PostgresStore, SqliteStore, UnifiedSchemaStore};
use schemascope_lib::{db, Error};

#[derive(Parser)]
#[command(name = "schemascope")]
#[command(about = "Browse PostgreSQL schemas and merge them into a unified schema document")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./schemascope.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store tables
    Init,

    /// List user schemas
    Schemas,

    /// List the tables of a schema with their foreign keys
    Tables { schema: String },

    /// List the columns of a table
    Columns { schema: String, table: String },

    /// Show the first rows of a table
    Data {
        schema: String,
        table: String,

        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Aggregate the configured schemas and store the unified schema
    Unify {
        /// Schema to include instead of the configured list (repeatable)
        #[arg(short, long = "schema")]
        schemas: Vec<String>,
    },

    /// Print the stored unified schema
    Show,

    /// Generate short descriptions of a table's columns
    Describe {
        schema: String,
        table: String,

        #[arg(short, long)]
        column: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    schemascope_lib::init_logging(&config.logging.level);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting schemascope");

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<Error>() {
                Some(Error::NotFound { .. }) => eprintln!("No unified schema data found."),
                _ => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: Config) -> Result<()> {
    let catalog = PostgresCatalog::new(config.catalog.clone());

    match command {
        Commands::Init => {
            open_store(&config, &catalog).await?;
            eprintln!("Store initialised.");
        }
        Commands::Schemas => print_json(&schema::list_schemas(&catalog).await?)?,
        Commands::Tables { schema: name } => {
            print_json(&schema::list_tables(&catalog, &name).await?)?
        }
        Commands::Columns { schema: name, table } => {
            print_json(&schema::get_columns(&catalog, &name, &table).await?)?
        }
        Commands::Data {
            schema: name,
            table,
            limit,
        } => print_json(&schema::get_table_data(&catalog, &name, &table, limit).await?)?,
        Commands::Unify { schemas } => {
            let store = open_store(&config, &catalog).await?;
            let overrides = (!schemas.is_empty()).then_some(schemas.as_slice());
            let doc =
                unified::create_unified_schema(&catalog, store.as_ref(), &config.unified, overrides)
                    .await?;
            eprintln!("Unified schema created successfully!");
            print_json(&doc)?;
        }
        Commands::Show => {
            let store = open_store(&config, &catalog).await?;
            print_json(&unified::get_unified_schema(store.as_ref(), &config.unified.key).await?)?;
        }
        Commands::Describe {
            schema: name,
            table,
            column,
        } => {
            let generator = GeminiClient::new(config.ai.clone()).map_err(Error::from)?;
            let descriptions =
                ai::describe_columns(&catalog, &generator, &name, &table, column.as_deref())
                    .await?;
            print_json(&descriptions)?;
        }
    }

    Ok(())
}

async fn open_store(
    config: &Config,
    catalog: &PostgresCatalog,
) -> Result<Box<dyn UnifiedSchemaStore>> {
    let store: Box<dyn UnifiedSchemaStore> = match config.store.backend {
        StoreBackend::Sqlite => {
            let path = match &config.store.path {
                Some(path) => path.clone(),
                None => db::default_db_path()?,
            };
            let pool = db::init_pool(&path)
                .await
                .with_context(|| format!("opening local store at {}", path.display()))?;
            Box::new(SqliteStore::new(pool, config.store.shape))
        }
        StoreBackend::Postgres => {
            let pool = catalog.pool().await?;
            Box::new(PostgresStore::new(pool, config.store.shape))
        }
    };
    store.init().await?;
    Ok(store)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
