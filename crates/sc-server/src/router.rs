//! Axum router construction.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Room for multipart boundaries and headers on top of the file cap.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit: usize = ctx
        .config
        .upload
        .max_bytes
        .saturating_add(MULTIPART_OVERHEAD)
        .try_into()
        .unwrap_or(usize::MAX);

    let api = Router::new()
        .route(
            "/convert",
            post(routes::convert::convert).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/watch/status", get(routes::watch::status))
        .route("/watch/start", post(routes::watch::start))
        .route("/watch/stop", post(routes::watch::stop))
        .route("/health", get(routes::health::health_check))
        .route("/tools", get(routes::health::tools));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
