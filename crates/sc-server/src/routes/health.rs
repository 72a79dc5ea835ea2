//! Health and tool availability route handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::context::AppContext;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub port: u16,
    pub is_termux: bool,
}

/// GET /api/health
pub async fn health_check(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        port: ctx.config.server.port,
        is_termux: ctx.platform.termux,
    })
}

/// GET /api/tools
pub async fn tools(State(ctx): State<AppContext>) -> Json<Vec<sc_av::ToolInfo>> {
    // Version detection spawns processes synchronously.
    let registry = ctx.tools.clone();
    let infos = tokio::task::spawn_blocking(move || registry.check_all())
        .await
        .unwrap_or_default();
    Json(infos)
}
