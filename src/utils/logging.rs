//! Logging configuration and setup
//!
//! Builds the global tracing subscriber from the configured verbosity level.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::utils::errors::Result;

/// Initialize logging based on the configured level (debug/info/warn/error).
///
/// `RUST_LOG` takes precedence when set, so a single module can still be
/// turned up without touching the config file.
pub fn init_logging(verbose: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(verbose))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .init();

    info!(level = verbose, "Logging initialized");
    Ok(())
}
