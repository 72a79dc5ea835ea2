//! Watch loop control route handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchStatusResponse {
    pub enabled: bool,
    pub input_dir: String,
    pub output_dir: String,
    pub is_termux: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchStartResponse {
    pub success: bool,
    pub enabled: bool,
    pub input_dir: String,
    pub output_dir: String,
}

#[derive(Debug, Serialize)]
pub struct WatchStopResponse {
    pub success: bool,
    pub enabled: bool,
}

/// GET /api/watch/status
pub async fn status(State(ctx): State<AppContext>) -> Json<WatchStatusResponse> {
    Json(WatchStatusResponse {
        enabled: ctx.watch.is_running(),
        input_dir: ctx.watch.input_dir().display().to_string(),
        output_dir: ctx.watch.output_dir().display().to_string(),
        is_termux: ctx.platform.termux,
    })
}

/// POST /api/watch/start
///
/// `success` is false when the loop was already running.
pub async fn start(
    State(ctx): State<AppContext>,
) -> Result<Json<WatchStartResponse>, AppError> {
    let success = ctx.watch.start().await?;
    Ok(Json(WatchStartResponse {
        success,
        enabled: ctx.watch.is_running(),
        input_dir: ctx.watch.input_dir().display().to_string(),
        output_dir: ctx.watch.output_dir().display().to_string(),
    }))
}

/// POST /api/watch/stop
///
/// `success` is false when the loop was not running.
pub async fn stop(State(ctx): State<AppContext>) -> Json<WatchStopResponse> {
    let success = ctx.watch.stop();
    Json(WatchStopResponse {
        success,
        enabled: ctx.watch.is_running(),
    })
}
