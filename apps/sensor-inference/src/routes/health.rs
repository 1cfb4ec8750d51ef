use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::engine::EngineStatus;
use crate::state::AppState;

async fn healthz() -> &'static str {
    "ok"
}

async fn get_status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.engine.status())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/status", get(get_status))
}
