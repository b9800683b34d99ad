//! HTTP routes next to the WebSocket
//!
//! The game itself is played over `/ws`; these endpoints exist for probes
//! and for clients that only want to peek at the board.

use axum::{extract::State, routing::get, Json, Router};
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::controller::GameSnapshot;
use crate::state::AppState;
use crate::ws;

async fn health() -> &'static str {
    "ok"
}

/// GET /api/snapshot
pub async fn get_snapshot(State(state): State<AppState>) -> Json<GameSnapshot> {
    Json(state.snapshot())
}

/// Full application router; unknown paths fall through to `static_dir`
pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/snapshot", get(get_snapshot))
        .route("/ws", get(ws::ws_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
