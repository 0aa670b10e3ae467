//! Admin HTTP API
//!
//! Health and status probes, a heartbeat, a diagnostic echo route and the
//! bearer-protected admin surface. Panics are caught at this layer and
//! rendered as 500 envelopes; users never see stack traces.

pub mod response;

pub use response::{ApiError, ApiResponse};

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};

use crate::config::Settings;
use crate::database::Storage;
use crate::services::{FieldValue, MetricsSink};
use crate::telegram::Gateway;
use crate::utils::errors::Result;

/// Shared state for every route.
#[derive(Clone)]
pub struct ServerContext {
    pub settings: Arc<Settings>,
    pub storage: Storage,
    pub gateway: Gateway,
    pub metrics: MetricsSink,
    pub started_at: Instant,
}

/// Build the router with its public and admin route groups.
pub fn build_router(ctx: ServerContext) -> Router {
    let admin = Router::new()
        .route("/admin/verify", post(verify_users))
        .layer(axum::middleware::from_fn_with_state(ctx.clone(), authorization));

    let health = get(health_check);

    Router::new()
        .route("/health", health.clone())
        .route("/status", health.clone())
        .route("/healthz", health.clone())
        .route("/statusz", health.clone())
        .route("/metrics", health.clone())
        .route("/info", health)
        .route("/ping", get(ping))
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .merge(admin)
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(recover_panic))
        .layer(TimeoutLayer::new(Duration::from_secs(ctx.settings.api.timeout_seconds)))
        .with_state(ctx)
}

/// Bind and serve until the shutdown token fires.
pub async fn run_server(ctx: ServerContext, shutdown: CancellationToken) -> Result<()> {
    let address = format!("{}:{}", ctx.settings.api.host, ctx.settings.api.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(address = %address, "Admin API listening");

    let app = build_router(ctx);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

async fn ping() -> &'static str {
    "pong"
}

async fn not_found() -> Response {
    ApiResponse::error("not_found", "Not found").not_found()
}

/// Aggregated component status plus process vitals.
async fn health_check(State(ctx): State<ServerContext>) -> Response {
    let database_status = match ctx.storage.status().await {
        Ok(status) => status.to_string(),
        Err(err) => err.to_string(),
    };
    let healthy = database_status == "ok";

    let uptime = ctx.started_at.elapsed();
    let (allocated_mb, reserved_mb) = memory_usage_mb();
    let cpu = std::thread::available_parallelism().map(usize::from).unwrap_or(1);
    let runtime = tokio::runtime::Handle::current().metrics();
    let tasks = runtime.num_alive_tasks();

    let data = json!({
        "status": {
            "database": database_status,
            "server": "ok",
            "telegram": "ok",
        },
        "uptime": format!("{uptime:?}"),
        "memory": format!("{allocated_mb} Mb / {reserved_mb} Mb"),
        "cpu": cpu,
        "tasks": tasks,
    });

    ctx.metrics.log_event(
        "health_check",
        &[],
        &[
            ("healthy", FieldValue::Bool(healthy)),
            ("uptime_seconds", FieldValue::Int(uptime.as_secs() as i64)),
            ("allocated_memory", FieldValue::Int(allocated_mb as i64)),
            ("reserved_memory", FieldValue::Int(reserved_mb as i64)),
            ("cpu", FieldValue::Int(cpu as i64)),
            ("tasks", FieldValue::Int(tasks as i64)),
        ],
    );

    if healthy {
        ApiResponse::data(data).send_ok()
    } else {
        ApiResponse::error("status_error", "One or more services are not healthy")
            .with_data(data)
            .internal_server_error()
    }
}

#[derive(Debug, Deserialize)]
struct VerifyUsersRequest {
    ids: Option<Vec<i64>>,
    reason: Option<String>,
}

/// `POST /admin/verify`: upsert verified rows for the given user ids.
async fn verify_users(
    State(ctx): State<ServerContext>,
    body: std::result::Result<Json<VerifyUsersRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return ApiResponse::error("bad_request", rejection.to_string()).bad_request();
        }
    };

    let ids = request.ids.unwrap_or_default();
    if ids.is_empty() {
        return ApiResponse::error("bad_request", "IDs are required").bad_request();
    }

    let reason = request
        .reason
        .filter(|reason| !reason.is_empty())
        .unwrap_or_else(|| "Verified from API".to_string());

    match ctx.storage.verify_users(&reason, &ids).await {
        Ok(()) => ApiResponse::ok().send_ok(),
        Err(err) => {
            error!(error = %err, "Verifying users from API failed");
            ApiResponse::error("internal_server_error", err.to_string()).internal_server_error()
        }
    }
}

/// Diagnostic echo of the incoming request.
async fn echo(request: Request) -> Response {
    let method = request.method().to_string();
    let url = request.uri().to_string();
    let headers: serde_json::Map<String, serde_json::Value> = request
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                serde_json::Value::String(value.to_str().unwrap_or_default().to_string()),
            )
        })
        .collect();

    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("application/json"))
        .unwrap_or(false);

    let bytes = match axum::body::to_bytes(request.into_body(), 1024 * 1024).await {
        Ok(bytes) => bytes,
        Err(err) => return ApiResponse::error("bad_request", err.to_string()).bad_request(),
    };

    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else if is_json {
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => return ApiResponse::error("bad_request", err.to_string()).bad_request(),
        }
    } else {
        return ApiResponse::error("bad_request", "Content-Type must be application/json").bad_request();
    };

    ApiResponse::data(json!({
        "url": url,
        "method": method,
        "headers": headers,
        "body": body,
    }))
    .send_ok()
}

/// Bearer authentication for the admin route group.
async fn authorization(State(ctx): State<ServerContext>, request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if header.is_empty() {
        return ApiResponse::error("unauthorized", "Authorization header is required").unauthorized();
    }

    let Some(token) = header.strip_prefix("Bearer ") else {
        return ApiResponse::error("unauthorized", "Bearer token is required").unauthorized();
    };

    if ctx.settings.secret.is_empty() || token != ctx.settings.secret {
        return ApiResponse::error("unauthorized", "Invalid Bearer token").unauthorized();
    }

    next.run(request).await
}

/// Panic recoverer: log with the panic payload and answer with a terse 500.
fn recover_panic(panic: Box<dyn std::any::Any + Send + 'static>) -> axum::http::Response<Body> {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "unknown panic".to_string()
    };

    error!(panic = %detail, "Recovered from panic in HTTP handler");

    ApiResponse::error("internal_server_error", "Internal Server Error").internal_server_error()
}

/// Resident and virtual process memory in megabytes; zeros off Linux.
fn memory_usage_mb() -> (u64, u64) {
    const PAGE_SIZE: u64 = 4096;
    const BYTES_IN_MB: u64 = 1024 * 1024;

    let statm = match std::fs::read_to_string("/proc/self/statm") {
        Ok(statm) => statm,
        Err(_) => return (0, 0),
    };

    let mut fields = statm.split_whitespace();
    let vsize_pages: u64 = fields.next().and_then(|f| f.parse().ok()).unwrap_or(0);
    let resident_pages: u64 = fields.next().and_then(|f| f.parse().ok()).unwrap_or(0);

    (
        resident_pages * PAGE_SIZE / BYTES_IN_MB,
        vsize_pages * PAGE_SIZE / BYTES_IN_MB,
    )
}
