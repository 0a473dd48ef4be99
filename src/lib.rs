pub mod ai;
pub mod commands;
pub mod config;
pub mod database;
pub mod db;
pub mod error;

pub use error::{Error, Result};

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` overrides `default_level`. Safe to call more than once.
pub fn init_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level.to_lowercase())),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
