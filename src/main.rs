//! ChatWarden Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

use ChatWarden::{
    config::Settings,
    database::Storage,
    server::{self, ServerContext},
    services::{self, BanLookupService, FieldValue, MetricsSink},
    telegram::{self, Dependencies, Gateway},
    utils::logging,
};

const SHUTDOWN_BUDGET: Duration = Duration::from_secs(10);
const METRICS_FLUSH_BUDGET: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    logging::init_logging(&settings.verbose)?;

    info!(environment = %settings.environment, "Starting ChatWarden...");

    // Shared outbound HTTP client (SOCKS5-aware)
    let http_client = services::build_http_client(settings.proxy.as_ref())?;

    // Metrics sink: real when fully configured, no-op otherwise
    let (metrics, metrics_handle) = if settings.metrics.is_valid() {
        let (sink, handle) = MetricsSink::influx(&settings.metrics, http_client.clone());
        (sink, Some(handle))
    } else {
        info!("Metrics config incomplete, using no-op sink");
        (MetricsSink::noop(), None)
    };

    // Storage: connect and auto-migrate
    info!("Connecting to database...");
    let storage = Storage::new(&settings.database).await?;

    // Telegram gateway
    let gateway = Gateway::new(&settings, http_client.clone());

    // Record the bot's own account
    let me = gateway.me().await?;
    info!(bot_id = me.id, username = %me.username, "Bot account loaded");
    storage.upsert_user(&me).await?;

    let settings = Arc::new(settings);
    let shutdown = CancellationToken::new();
    let recorder_tasks = TaskTracker::new();

    let deps = Dependencies {
        settings: settings.clone(),
        storage: storage.clone(),
        gateway: gateway.clone(),
        ban_lookup: BanLookupService::new(http_client.clone()),
        metrics: metrics.clone(),
        recorder_tasks: recorder_tasks.clone(),
    };

    // Update pump
    let mut dispatcher = telegram::build_dispatcher(deps);
    let polling_token = dispatcher.shutdown_token();
    let dispatcher_handle = tokio::spawn(async move {
        dispatcher.dispatch().await;
    });

    // Admin HTTP API
    let server_ctx = ServerContext {
        settings: settings.clone(),
        storage: storage.clone(),
        gateway: gateway.clone(),
        metrics: metrics.clone(),
        started_at: Instant::now(),
    };
    let server_shutdown = shutdown.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(err) = server::run_server(server_ctx, server_shutdown).await {
            error!(error = %err, "Admin API server failed");
        }
    });

    // Captcha expiry sweeper
    let sweep_interval = settings.captcha.expiration() / 10;
    let sweeper_handle =
        services::spawn_sweeper(storage.clone(), gateway.clone(), sweep_interval, shutdown.clone());

    let port = settings.api.port;
    metrics.log_event(
        "server_started",
        &[],
        &[
            ("host", FieldValue::Str(settings.api.host.clone())),
            ("port", FieldValue::Int(i64::from(port))),
        ],
    );
    info!(host = %settings.api.host, port, "Server started");

    // Block until SIGINT or SIGTERM
    wait_exit_signal().await;
    info!("Shutdown signal received");

    // Everything gets one shared 10-second budget; whatever is not done by
    // then is abandoned.
    shutdown.cancel();
    recorder_tasks.close();

    let graceful = tokio::time::timeout(SHUTDOWN_BUDGET, async {
        if let Ok(stopped) = polling_token.shutdown() {
            stopped.await;
        }
        let _ = dispatcher_handle.await;
        let _ = server_handle.await;
        let _ = sweeper_handle.await;
        recorder_tasks.wait().await;
    })
    .await;

    if graceful.is_err() {
        error!("Graceful shutdown budget exceeded, abandoning remaining tasks");
    }

    // Dropping the last sink handle lets the drain task flush and exit.
    drop(metrics);
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(METRICS_FLUSH_BUDGET, handle).await;
    }

    storage.close().await;
    info!("Shutdown complete");

    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn wait_exit_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(err) => {
                error!(error = %err, "Installing SIGTERM handler failed");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
