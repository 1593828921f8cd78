use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use scantally_core::protocol::{
    parse_batch_body, HealthResponse, RecentScan, SkuTotal, SyncResponse, MAX_RECENT_SCANS,
};
use scantally_core::services::ScanStoreService;
use scantally_core::util::unix_millis_now;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::assets;
use crate::config::AppConfig;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    store: ScanStoreService,
}

impl AppState {
    pub const fn new(config: Arc<AppConfig>, store: ScanStoreService) -> Self {
        Self { config, store }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(assets::index))
        .route("/manifest.json", get(assets::manifest))
        .route("/service-worker.js", get(assets::service_worker))
        .route("/sw.js", get(assets::service_worker))
        .route("/api/scan", post(submit_scans))
        .route("/api/scans", get(recent_scans))
        .route("/api/scans/summary", get(scan_summary))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// The body is taken raw so malformed JSON maps to the documented 400 body
// instead of axum's own rejection.
async fn submit_scans(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SyncResponse>, AppError> {
    let items = parse_batch_body(&body).map_err(|_| AppError::BadPayload)?;
    let received = items.len();

    let synced_ids = state.store.submit_batch(&items, unix_millis_now()).await?;
    tracing::info!(
        endpoint = "submit_scans",
        received,
        acknowledged = synced_ids.len(),
        "Accepted scan batch"
    );
    Ok(Json(SyncResponse { synced_ids }))
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<String>,
}

async fn recent_scans(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<RecentScan>>, AppError> {
    let limit = resolve_limit(query.limit.as_deref(), state.config.recent_limit);
    let scans = state.store.list_recent(limit).await?;
    Ok(Json(scans.iter().map(RecentScan::from).collect()))
}

async fn scan_summary(State(state): State<AppState>) -> Result<Json<Vec<SkuTotal>>, AppError> {
    let summary = state.store.summarize().await?;
    Ok(Json(summary.iter().map(SkuTotal::from).collect()))
}

/// Unparseable limits fall back to the configured default; the result is
/// always within `[1, MAX_RECENT_SCANS]`.
fn resolve_limit(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .map_or(default, |value| {
            usize::try_from(value.max(1)).unwrap_or(MAX_RECENT_SCANS)
        })
        .clamp(1, MAX_RECENT_SCANS)
}
