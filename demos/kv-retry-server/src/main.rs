//! Key-value HTTP API with throttled reconnects
//!
//! This demo serves two paths over the same in-memory store:
//! 1. `/api/retry/redis/*` goes through `ResilientStore`: a failed call asks
//!    the shared reconnect throttle for a reconnect and retries once, and
//!    reads fall back to a degraded value when the throttle says no
//! 2. `/api/redis/*` calls the store directly, with no retry and no fallback
//!
//! `POST /admin/outage?enabled=true` breaks the store so both paths can be
//! compared, and `GET /health/throttle` shows what the throttle is doing.

use axum::{
    extract::{Query, State},
    http::{HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use clap::Parser;
use kv_resilience_fallback::Fallback;
use kv_resilience_reconnect::{ReconnectConfig, ReconnectThrottle};
use kv_resilience_store::{
    DeleteSummary, KvStore, MemoryStore, OperationOutcome, ReadOutcome, ResilientStore,
    StoreOperation, WriteOutcome,
};
use serde::Deserialize;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceExt;
use tracing_subscriber::EnvFilter;

const FALLBACK_HEADER: HeaderName = HeaderName::from_static("x-fallback");

#[derive(Parser, Debug)]
#[command(about = "Key-value HTTP API with throttled reconnects")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Minimum seconds between two forced reconnects
    #[arg(long, default_value_t = 30)]
    min_reconnect_interval_secs: u64,

    /// Seconds of unbroken failure after which reconnects stop
    #[arg(long, default_value_t = 1800)]
    max_failure_window_secs: u64,

    /// Milliseconds a request waits for another request's reconnect
    #[arg(long, default_value_t = 1000)]
    reconnect_lock_timeout_ms: u64,

    /// Value served for reads the store cannot answer
    #[arg(long, default_value = "fallback_value")]
    fallback_value: String,
}

#[derive(Clone)]
struct AppState {
    memory: Arc<MemoryStore>,
    store: ResilientStore<Arc<MemoryStore>>,
}

impl AppState {
    fn new(args: &Args) -> Self {
        let memory = Arc::new(MemoryStore::new());
        memory.heal_on_reconnect(true);

        let throttle = ReconnectThrottle::new(
            ReconnectConfig::builder()
                .name("kv-store-connection")
                .min_reconnect_interval(Duration::from_secs(args.min_reconnect_interval_secs))
                .max_failure_window(Duration::from_secs(args.max_failure_window_secs))
                .reconnect_lock_timeout(Duration::from_millis(args.reconnect_lock_timeout_ms))
                .build(),
        );

        let store = ResilientStore::builder(Arc::clone(&memory))
            .name("kv-retry-api")
            .throttle(Arc::new(throttle))
            .fallback(
                Fallback::builder()
                    .name("kv-retry-api")
                    .value(args.fallback_value.clone())
                    .build(),
            )
            .build();

        Self { memory, store }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let listener = TcpListener::bind(args.listen).await.expect("bind error");
    let addr = args.listen;

    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Try it:");
    tracing::info!(
        "  curl -X POST 'http://{}/api/retry/redis/write?key=k1&value=v1'",
        addr
    );
    tracing::info!("  curl 'http://{}/api/retry/redis/read?key=k1'", addr);
    tracing::info!("  curl -X POST 'http://{}/admin/outage?enabled=true'", addr);
    tracing::info!("  curl http://{}/health/throttle", addr);

    axum::serve(listener, app(AppState::new(&args)).into_make_service())
        .await
        .expect("server error");
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/retry/redis/write", post(retry_write))
        .route("/api/retry/redis/read", get(retry_read))
        .route("/api/retry/redis/deleteAll", delete(retry_delete_all))
        .route("/api/redis/write", post(direct_write))
        .route("/api/redis/read", get(direct_read))
        .route("/admin/outage", post(set_outage))
        .route("/health/throttle", get(throttle_health))
        .with_state(state)
}

#[derive(Deserialize)]
struct WriteParams {
    key: String,
    value: String,
}

#[derive(Deserialize)]
struct ReadParams {
    key: String,
}

async fn retry_write(
    State(state): State<AppState>,
    Query(params): Query<WriteParams>,
) -> impl IntoResponse {
    match state.store.write(params.key, params.value).await {
        WriteOutcome::Completed { .. } => (StatusCode::OK, "Write operation completed"),
        WriteOutcome::Failed { .. } => (StatusCode::SERVICE_UNAVAILABLE, "Write operation failed"),
    }
}

/// Degraded values are returned as-is and marked with `x-fallback: true`.
async fn retry_read(State(state): State<AppState>, Query(params): Query<ReadParams>) -> Response {
    match state.store.read(params.key).await {
        ReadOutcome::Found { value, .. } => (StatusCode::OK, value).into_response(),
        ReadOutcome::NotFound { .. } => (
            StatusCode::OK,
            "Key not found or fallback value returned",
        )
            .into_response(),
        ReadOutcome::Fallback { value, .. } => {
            (StatusCode::OK, [(FALLBACK_HEADER, "true")], value).into_response()
        }
    }
}

async fn retry_delete_all(State(state): State<AppState>) -> Response {
    let outcome = state
        .store
        .clone()
        .oneshot(StoreOperation::DeleteAll)
        .await;

    match outcome {
        Ok(OperationOutcome::DeleteAll(summary @ DeleteSummary::Error { .. })) => {
            (StatusCode::INTERNAL_SERVER_ERROR, summary.to_string()).into_response()
        }
        Ok(OperationOutcome::DeleteAll(summary)) => {
            (StatusCode::OK, summary.to_string()).into_response()
        }
        Ok(other) => {
            tracing::error!("Unexpected outcome for delete-all: {:?}", other);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(never) => match never {},
    }
}

/// Direct write, no throttle and no retry.
async fn direct_write(
    State(state): State<AppState>,
    Query(params): Query<WriteParams>,
) -> impl IntoResponse {
    match state.memory.set(&params.key, &params.value) {
        Ok(()) => (StatusCode::OK, "Data written!".to_string()),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

/// Direct read, no throttle and no fallback.
async fn direct_read(
    State(state): State<AppState>,
    Query(params): Query<ReadParams>,
) -> impl IntoResponse {
    match state.memory.get(&params.key) {
        Ok(Some(value)) => (StatusCode::OK, value),
        Ok(None) => (StatusCode::OK, "Key not found!".to_string()),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

#[derive(Deserialize)]
struct OutageParams {
    enabled: bool,
    /// Whether a reconnect ends the outage (default: true)
    heal_on_reconnect: Option<bool>,
}

/// Admin endpoint to break or repair the store
///
/// Examples:
/// - enabled=true → every store call fails until the next reconnect
/// - enabled=true&heal_on_reconnect=false → calls fail until enabled=false
/// - enabled=false → store is healthy again
async fn set_outage(
    State(state): State<AppState>,
    Query(params): Query<OutageParams>,
) -> impl IntoResponse {
    let heal = params.heal_on_reconnect.unwrap_or(true);
    state.memory.heal_on_reconnect(heal);
    state.memory.set_outage(params.enabled);

    tracing::info!(enabled = params.enabled, heal, "Store outage toggled");

    Json(serde_json::json!({
        "outage": params.enabled,
        "heal_on_reconnect": heal,
        "tip": "Read through /api/retry/redis/read and /api/redis/read to compare"
    }))
}

async fn throttle_health(State(state): State<AppState>) -> impl IntoResponse {
    let throttle = state.store.throttle();
    let snapshot = throttle.snapshot();
    let config = throttle.config();

    Json(serde_json::json!({
        "phase": snapshot.phase,
        "failing_for_secs": snapshot.first_failure.map(|start| start.elapsed().as_secs_f64()),
        "since_last_reconnect_secs": snapshot.last_reconnect.elapsed().as_secs_f64(),
        "reconnects": snapshot.reconnects,
        "denials": snapshot.denials,
        "config": {
            "min_reconnect_interval_secs": config.min_reconnect_interval().as_secs(),
            "max_failure_window_secs": config.max_failure_window().as_secs(),
            "reconnect_lock_timeout_ms": config.reconnect_lock_timeout().as_millis() as u64,
        },
        "store": {
            "outage": state.memory.is_out(),
            "keys_stored": state.memory.len(),
        }
    }))
}
