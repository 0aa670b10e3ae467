//! Database connection management
//!
//! Maps the configured driver to a connection URL and builds the pool. One
//! query set serves every supported backend through sqlx's Any driver, so
//! this module is the only place that knows driver names.

use std::str::FromStr;
use std::time::Duration;

use sqlx::any::{install_default_drivers, AnyConnectOptions, AnyPoolOptions};
use sqlx::ConnectOptions;

use crate::config::DatabaseConfig;
use crate::utils::errors::{ChatWardenError, Result};

pub type DatabasePool = sqlx::AnyPool;

/// Translate `driver` + `connection` into a sqlx URL.
pub fn database_url(config: &DatabaseConfig) -> Result<String> {
    match config.driver.to_lowercase().as_str() {
        "sqlite3" | "sqlite" => {
            if config.connection == ":memory:" {
                Ok("sqlite::memory:".to_string())
            } else if config.connection.starts_with("sqlite:") {
                Ok(config.connection.clone())
            } else {
                Ok(format!("sqlite://{}?mode=rwc", config.connection))
            }
        }
        "postgres" => {
            if config.connection.starts_with("postgres://") || config.connection.starts_with("postgresql://") {
                Ok(config.connection.clone())
            } else {
                Ok(format!("postgres://{}", config.connection))
            }
        }
        other => Err(ChatWardenError::Config(format!(
            "Unsupported database driver '{other}'"
        ))),
    }
}

/// Create a new database connection pool and probe it.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool> {
    install_default_drivers();

    let url = database_url(config)?;
    let mut options = AnyConnectOptions::from_str(&url)?;
    options = if config.logging {
        options.log_statements(log::LevelFilter::Debug)
    } else {
        options.disable_statement_logging()
    };

    // An in-memory database lives and dies with its connection, so the
    // pool must hold exactly one and never let it go.
    let in_memory = url.starts_with("sqlite::memory:");
    let pool = AnyPoolOptions::new()
        .max_connections(if in_memory { 1 } else { 10 })
        .min_connections(u32::from(in_memory))
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;

    tracing::debug!(driver = %config.driver, "Database connection pool created");
    Ok(pool)
}
