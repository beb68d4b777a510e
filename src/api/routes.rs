//! HTTP API route definitions.

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN},
        HeaderValue,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::info;

use super::handlers::{
    activity, all_activity, anime, not_found, preflight, seasonal, sync, trending, AppState,
};

/// Create the API router.
///
/// A wrong method on a known path falls through to the same 404 listing as an unknown path.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Read endpoints
        .route("/api/activity", get(activity).fallback(not_found))
        .route("/api/activity/all", get(all_activity).fallback(not_found))
        .route("/api/anime/", get(anime).fallback(not_found))
        .route("/api/anime/*rest", get(anime).fallback(not_found))
        .route("/api/trending", get(trending).fallback(not_found))
        .route("/api/seasonal", get(seasonal).fallback(not_found))
        // Write endpoint
        .route("/api/sync", post(sync).fallback(not_found))
        .fallback(not_found)
        .layer(middleware::from_fn(preflight))
        .layer(TraceLayer::new_for_http())
        // CORS headers on every response, preflight and errors included
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .with_state(state)
}

/// Bind `addr` and serve `router` until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, router: Router, shutdown: F) -> crate::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
