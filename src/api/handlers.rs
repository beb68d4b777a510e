//! HTTP API handlers.

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use super::auth::SyncAuth;
use crate::error::{ApiError, StoreError};
use crate::metrics;
use crate::season::current_season;
use crate::snapshot::{anime_key, present_field, ActivityPlaceholder, SyncRequest, OVERALL_KEY};
use crate::store::SharedStore;

/// Message returned when a title has no snapshot.
pub const ANIME_NOT_MONITORED: &str = "Anime not being monitored";

/// Endpoints advertised on a routing miss.
pub const ENDPOINTS: [&str; 6] = [
    "/api/activity - Overall MAL activity",
    "/api/activity/all - All monitors",
    "/api/anime/:id - Specific anime activity",
    "/api/trending - Trending anime list",
    "/api/seasonal - Current season anime",
    "POST /api/sync - Sync data from operator (dev)",
];

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Snapshot store every handler reads from or writes to.
    pub store: SharedStore,
    /// Policy applied to sync writes.
    pub sync_auth: SyncAuth,
}

impl AppState {
    /// Create new app state with an open sync endpoint.
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            sync_auth: SyncAuth::Open,
        }
    }

    /// Replace the sync access policy.
    pub fn with_sync_auth(mut self, sync_auth: SyncAuth) -> Self {
        self.sync_auth = sync_auth;
        self
    }
}

/// Monitors response.
#[derive(Debug, Serialize)]
pub struct MonitorsResponse {
    /// Every stored snapshot, in listing order.
    pub monitors: Vec<Value>,
}

/// Trending response.
#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    pub trending: Value,
}

/// Seasonal response.
#[derive(Debug, Serialize)]
pub struct SeasonalResponse {
    pub seasonal: Value,
    /// Label such as "Fall 2024".
    pub season: Value,
}

/// Sync write response.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    /// Key the snapshot was written to.
    pub key: String,
}

fn store_failure(op: &'static str) -> impl FnOnce(StoreError) -> ApiError {
    move |err| {
        warn!(op, error = %err, "Store operation failed");
        ApiError::Store(err)
    }
}

async fn fetch_overall(state: &AppState) -> Result<Option<Value>, ApiError> {
    let data = state
        .store
        .get(OVERALL_KEY)
        .await
        .map_err(store_failure("get"))?;
    Ok(data.filter(|value| !value.is_null()))
}

/// Answer CORS preflight requests on any path with an empty 200.
///
/// HEAD is a routing miss here. Axum serves HEAD from every GET route, so it is turned away
/// before routing.
pub async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    if request.method() == Method::HEAD {
        return not_found().await.into_response();
    }
    next.run(request).await
}

/// Overall activity handler - returns the `mal-overall` snapshot or a placeholder.
#[instrument(skip(state))]
pub async fn activity(State(state): State<AppState>) -> Result<Response, ApiError> {
    metrics::inc_requests("activity");

    match fetch_overall(&state).await? {
        Some(data) => Ok(Json(data).into_response()),
        None => {
            debug!("No overall snapshot yet");
            Ok(Json(ActivityPlaceholder::default()).into_response())
        }
    }
}

/// All-monitors handler - lists every key and fetches each snapshot in order.
#[instrument(skip(state))]
pub async fn all_activity(State(state): State<AppState>) -> Result<Json<MonitorsResponse>, ApiError> {
    metrics::inc_requests("activity_all");

    let keys = state.store.list().await.map_err(store_failure("list"))?;
    let mut monitors = Vec::with_capacity(keys.len());

    for key in &keys {
        let data = state.store.get(key).await.map_err(store_failure("get"))?;
        match data {
            Some(value) if !value.is_null() => monitors.push(value),
            _ => debug!(key = %key, "Listed key has no value, skipping"),
        }
    }

    Ok(Json(MonitorsResponse { monitors }))
}

/// Anime id taken as the raw segment after `/api/anime/`.
pub fn anime_id_from_path(path: &str) -> &str {
    path.split('/').nth(3).unwrap_or("")
}

/// Single-anime handler - returns the `anime-<id>` snapshot or 404.
#[instrument(skip(state))]
pub async fn anime(State(state): State<AppState>, uri: Uri) -> Result<Response, ApiError> {
    metrics::inc_requests("anime");

    let key = anime_key(anime_id_from_path(uri.path()));
    let data = state.store.get(&key).await.map_err(store_failure("get"))?;

    match data {
        Some(data) if !data.is_null() => Ok(Json(data).into_response()),
        _ => {
            debug!(key = %key, "Anime not monitored");
            Err(ApiError::NotFound(ANIME_NOT_MONITORED))
        }
    }
}

/// Trending handler - returns the overall snapshot's trending list.
#[instrument(skip(state))]
pub async fn trending(State(state): State<AppState>) -> Result<Json<TrendingResponse>, ApiError> {
    metrics::inc_requests("trending");

    let trending = fetch_overall(&state)
        .await?
        .and_then(|data| present_field(&data, "trendingAnime").cloned())
        .unwrap_or_else(|| json!([]));

    Ok(Json(TrendingResponse { trending }))
}

/// Seasonal handler - prefers the seasonal list, falling back to trending.
#[instrument(skip(state))]
pub async fn seasonal(State(state): State<AppState>) -> Result<Json<SeasonalResponse>, ApiError> {
    metrics::inc_requests("seasonal");

    let Some(data) = fetch_overall(&state).await? else {
        return Ok(Json(SeasonalResponse {
            seasonal: json!([]),
            season: Value::String(current_season()),
        }));
    };

    let seasonal = present_field(&data, "seasonalAnime")
        .or_else(|| present_field(&data, "trendingAnime"))
        .cloned()
        .unwrap_or_else(|| json!([]));
    let season = present_field(&data, "currentSeason")
        .cloned()
        .unwrap_or_else(|| Value::String(current_season()));

    Ok(Json(SeasonalResponse { seasonal, season }))
}

/// Sync handler - overwrites one snapshot with the posted body.
#[instrument(skip(state, headers, body), fields(bytes = body.len()))]
pub async fn sync(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SyncResponse>, ApiError> {
    metrics::inc_requests("sync");

    state.sync_auth.authorize(&headers).inspect_err(|_| {
        warn!("Rejected unauthorized sync");
    })?;

    let request: SyncRequest = serde_json::from_slice(&body).map_err(|err| {
        warn!(error = %err, "Malformed sync payload");
        ApiError::Payload(err)
    })?;

    let key = request.target_key();
    let snapshot = request.into_snapshot(Utc::now());
    let value = serde_json::to_value(&snapshot).map_err(ApiError::Payload)?;

    state.store.put(&key, value).await.map_err(store_failure("put"))?;

    metrics::inc_sync_writes();
    info!(key = %key, "Snapshot synced");

    Ok(Json(SyncResponse { success: true, key }))
}

/// Routing miss - 404 with the endpoint listing.
pub async fn not_found() -> impl IntoResponse {
    metrics::inc_requests("not_found");

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not found",
            "endpoints": ENDPOINTS,
        })),
    )
}
